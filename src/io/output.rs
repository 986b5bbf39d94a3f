//! Output formatting and logging utilities

use color_eyre::eyre::Result;
use nalgebra::DMatrix;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let duration = StdSystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup output logging to file or stdout
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => match File::create(path) {
            Ok(log) => {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Output will be written to: {}", path);
            }
            Err(err) => eprintln!("Could not create output file {}: {}", path, err),
        },
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
            info!("Output will be printed to stdout");
        }
    }
}

/// Write a dense matrix row by row
pub fn write_matrix<W: Write>(writer: &mut W, title: &str, matrix: &DMatrix<f64>) -> Result<()> {
    writeln!(writer, "{} ({} x {}):", title, matrix.nrows(), matrix.ncols())?;
    for row in matrix.row_iter() {
        let line: Vec<String> = row.iter().map(|v| format!("{:+.8e}", v)).collect();
        writeln!(writer, "  {}", line.join(" "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_matrix_layout() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, -2.0, 0.5, 0.0]);
        let mut out = Vec::new();
        write_matrix(&mut out, "G", &m).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "G (2 x 2):");
        assert!(lines[1].contains("+1.00000000e0"));
        assert!(lines[1].contains("-2.00000000e0"));
    }
}
