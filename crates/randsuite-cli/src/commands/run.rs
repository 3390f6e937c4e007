use std::time::Instant;

use super::{CliError, InputArgs};
use crate::render;

pub fn run(path: &str, args: &InputArgs) -> Result<(), CliError> {
    let battery = super::build_battery(path, args)?;
    if battery.is_empty() {
        log::warn!("{path} holds no bits; every test will report an error");
    }

    let t0 = Instant::now();
    let report = battery.run_all();
    log::info!("battery finished in {:.2}s", t0.elapsed().as_secs_f64());

    print!("{}", render::battery_table(&report));
    super::write_json(args.json.as_deref(), &report)
}
