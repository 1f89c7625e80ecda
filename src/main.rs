//! Endless Overtake entry point
//!
//! Native: one autopiloted run against a file-backed garage, logged to
//! the console. The browser build goes through the library's `web` module.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use endless_overtake::persistence::FileStore;
    use endless_overtake::sim::{Autopilot, GLITCHES, RunPhase, SimEvent};
    use endless_overtake::{Session, kmh};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0xE0_2024);
    let data_dir = args.next().unwrap_or_else(|| ".endless-overtake".to_string());
    // Simulated seconds before giving up on a run that never crashes
    let time_limit = 600.0_f32;
    let dt = 1.0_f32 / 60.0;

    log::info!("Endless Overtake (native) seed {seed}, data in {data_dir}");

    let mut session = Session::new(FileStore::new(&data_dir), seed);
    let pilot = Autopilot::default();

    let offer = session.offer_run_modifiers().to_vec();
    let Some(&choice) = offer.first() else {
        log::error!("No run modifiers offered");
        return;
    };
    session.start_run(choice, 0.0);

    while session.sim().run_time < time_limit {
        if let RunPhase::AwaitingModifierChoice { offer } = session.phase() {
            let offer = offer.clone();
            if let Some(index) = pilot.pick_glitch(&offer) {
                session.choose_glitch(index);
            }
            continue;
        }
        if *session.phase() != RunPhase::Running {
            break;
        }

        let input = pilot.drive(session.sim());
        session.step(&input, dt);

        for event in session.take_events() {
            match event {
                SimEvent::StageAdvanced { stage } => {
                    log::info!(
                        "{:.1}s: stage {} at {} km/h",
                        session.sim().run_time,
                        stage + 1,
                        kmh(session.sim().player.speed)
                    );
                }
                SimEvent::GlitchStarted { index } => {
                    log::info!("{:.1}s: glitch {}", session.sim().run_time, GLITCHES[index].name);
                }
                SimEvent::Crashed(report) => {
                    println!(
                        "Run over: score {:.0}, {} overtakes, {:.0} m, +{} credits",
                        report.score, report.overtakes, report.meters, report.payout
                    );
                }
                _ => {}
            }
        }
    }

    if session.sim().is_running() {
        println!(
            "Time limit reached: score {:.0}, {} overtakes",
            session.sim().player.score,
            session.sim().progression.overtakes
        );
    }
    println!("Credits: {}", session.garage().credits);
    session.stop();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser entry point is `web::wasm_start`
}
