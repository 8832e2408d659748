use chrono::Local;
use csv::Writer;
use log::info;
use nalgebra::DVector;
use simplelog::*;
use std::fs::File;
use std::io;

/// true if the level string switches logging off entirely
pub fn logging_disabled(loglevel: &Option<String>) -> bool {
    loglevel
        .as_ref()
        .map(|level| level == "off" || level == "none")
        .unwrap_or(false)
}

pub fn level_filter(loglevel: &Option<String>) -> LevelFilter {
    match loglevel.as_deref() {
        Some("debug") => LevelFilter::Debug,
        Some("info") | None => LevelFilter::Info,
        Some("warn") => LevelFilter::Warn,
        Some("error") => LevelFilter::Error,
        Some("off") | Some("none") => LevelFilter::Off,
        Some(_) => LevelFilter::Info,
    }
}

/// Installs a terminal logger (plus a timestamped log file if `log_file` is set).
/// Returns false if logging is switched off or a logger is already installed; the
/// caller runs either way.
pub fn init_logger(loglevel: &Option<String>, log_file: bool) -> bool {
    if logging_disabled(loglevel) {
        return false;
    }
    let log_option = level_filter(loglevel);
    println!(" \n \n Program started with loglevel: {}", log_option);
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_option,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if log_file {
        let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let name = format!("log_{}.txt", date_and_time);
        match File::create(&name) {
            Ok(file) => loggers.push(WriteLogger::new(log_option, Config::default(), file)),
            Err(e) => println!("could not create log file {}: {}", name, e),
        }
    }
    CombinedLogger::init(loggers).is_ok()
}

/// Writes an optimization trajectory: one row per iterate with the iteration number,
/// the coordinates in `names` order and the objective value.
pub fn save_trajectory_to_csv(
    trajectory: &[DVector<f64>],
    objective_values: &[f64],
    names: &[String],
    filename: &str,
) -> io::Result<()> {
    if trajectory.len() != objective_values.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "trajectory and objective values differ in length",
        ));
    }
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);

    let mut headers = Vec::new();
    headers.push("iteration".to_string());
    headers.extend(names.iter().cloned());
    headers.push("objective".to_string());
    writer.write_record(&headers)?;

    for (i, (x, f)) in trajectory.iter().zip(objective_values.iter()).enumerate() {
        let mut row_data = Vec::new();
        row_data.push(i.to_string());
        row_data.extend(x.iter().map(|&val| val.to_string()));
        row_data.push(f.to_string());
        writer.write_record(&row_data)?;
    }

    writer.flush()?;
    info!("trajectory of {} points saved to {}", trajectory.len(), filename);
    Ok(())
}
