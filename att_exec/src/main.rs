//! Main attitude executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Load the two motion scripts and resolve the reference frame request
//!       against each device's capability bitmask
//!     - Initialise all modules
//!     - Spawn one replay producer per source, both feeding the bounded
//!       event channel
//!     - Main loop (the single consumer owning all engine state):
//!         - Receive the next source event
//!         - Raw record events are decoded, joined and recomputed by RelAtt
//!         - Relative attitude outputs are delivered to the consumer (logged
//!           as telemetry)
//!         - Malformed events are dropped with a warning, the stream carries
//!           on
//!     - Exit once both sources have signalled end of stream

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use att_lib::{
    data_store::DataStore,
    params::ExecParams,
    rel_att::InputData,
    replay::{spawn_replay, MotionScript},
    router::{event_channel, SensorSource, SourceEvent},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;

// Internal
use motion_if::frame::{self, ReferenceFrame};
use util::{
    logger::{logger_init, LevelFilter},
    maths::rad_to_deg,
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("att_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution
    info!("Headtrack Attitude Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("att_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- LOAD MOTION SCRIPTS ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    // Expect exactly two arguments, the primary and secondary script paths
    if args.len() != 3 {
        return Err(eyre!(
            "Expected two arguments (primary and secondary motion script paths), found {}",
            args.len() - 1
        ));
    }

    let primary_script =
        MotionScript::new(&args[1]).wrap_err("Failed to load the primary motion script")?;
    let secondary_script =
        MotionScript::new(&args[2]).wrap_err("Failed to load the secondary motion script")?;

    for (script, source) in [
        (&primary_script, SensorSource::Primary),
        (&secondary_script, SensorSource::Secondary),
    ]
    .iter()
    {
        info!(
            "Loaded {} script: {} records over {:.02} s, supported frames: {:?}",
            source.name(),
            script.num_records(),
            script.duration_s(),
            frame::names_of(script.capabilities)
        );
    }

    // ---- RESOLVE REFERENCE FRAMES ----

    // Parse the requested frame bit from the parameters, if any
    let request = match exec_params.frame_request {
        Some(bit) => match ReferenceFrame::from_bit(bit) {
            Some(f) => Some(f),
            None => {
                warn!(
                    "Frame request bit {:#06b} names no known reference frame, \
                    using device defaults",
                    bit
                );
                None
            }
        },
        None => None,
    };

    let primary_frame = resolve_frame(primary_script.capabilities, request, SensorSource::Primary);
    let secondary_frame = resolve_frame(
        secondary_script.capabilities,
        request,
        SensorSource::Secondary,
    );

    // The relative attitude is only meaningful when both sources report
    // against the same frame. This cannot be enforced from here, the devices
    // have the final say, so mismatches are called out loudly instead.
    if primary_frame != secondary_frame {
        warn!(
            "The two sources are using different reference frames ({} vs {}), \
            the relative attitude will be numerically valid but physically \
            meaningless",
            primary_frame.name(),
            secondary_frame.name()
        );
    }

    // ---- INITIALISE DATASTORE AND MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    ds.rel_att
        .init(primary_frame, &session)
        .wrap_err("Failed to initialise RelAtt")?;

    info!("Module initialisation complete\n");

    // ---- SPAWN TELEMETRY SOURCES ----

    let (event_tx, event_rx) = event_channel(exec_params.event_channel_bound);

    let primary_handle = spawn_replay(primary_script, SensorSource::Primary, event_tx.clone());
    let secondary_handle = spawn_replay(secondary_script, SensorSource::Secondary, event_tx);

    info!("Telemetry sources spawned");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    while let Ok(event) = event_rx.recv() {
        match event {
            SourceEvent::Record(source, record) => {
                ds.num_events += 1;

                let input = InputData { source, record };

                match ds.rel_att.proc(&input) {
                    Ok((output, report)) => {
                        ds.rel_att_status_rpt = report;

                        // Deliver the relative attitude to the consumer. One
                        // output per completed recompute, none while a slot is
                        // still empty.
                        if let Some(rel) = output {
                            info!(
                                "Relative attitude: pitch {:8.3} deg, roll {:8.3} deg, \
                                yaw {:8.3} deg",
                                rad_to_deg(rel.attitude.pitch_rad),
                                rad_to_deg(rel.attitude.roll_rad),
                                rad_to_deg(rel.attitude.yaw_rad)
                            );
                            ds.rel_att_output = Some(rel);
                        }
                    }
                    // A malformed record only loses that one event, the
                    // stream itself carries on
                    Err(e) => {
                        ds.num_malformed += 1;
                        warn!("Dropped malformed {} sample: {}", source.name(), e);
                    }
                }
            }
            SourceEvent::EndOfStream(source) => {
                info!("End of stream from {} source", source.name());
                ds.mark_stream_ended(source);

                if ds.all_streams_ended() {
                    break;
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    primary_handle.join().ok();
    secondary_handle.join().ok();

    info!(
        "End of execution: {} events received, {} malformed, {} relative \
        attitudes emitted",
        ds.num_events, ds.num_malformed, ds.rel_att_status_rpt.num_emitted
    );

    Ok(())
}

/// Resolve the frame request against one device's capability bitmask, falling
/// back to the device default frame if the request is unsupported.
fn resolve_frame(
    bitmask: u32,
    request: Option<ReferenceFrame>,
    source: SensorSource,
) -> ReferenceFrame {
    match frame::select_frame(bitmask, request) {
        Ok(f) => {
            info!("{} source frame: {}", source.name(), f.name());
            f
        }
        Err(e) => {
            let fallback = frame::default_frame(bitmask);
            warn!(
                "{} ({} source), falling back to the device default frame: {}",
                e,
                source.name(),
                fallback.name()
            );
            fallback
        }
    }
}
