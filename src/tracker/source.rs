use crate::domain::{Coordinate, CoordinateError, PositionSample};
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::Sender;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{info, instrument, warn};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("the dispatcher stopped accepting samples")]
    DispatcherClosed,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("expected 'latitude,longitude', got '{0}'")]
    Malformed(String),
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordinateError),
}

/// Parses a `latitude,longitude` line in decimal degrees.
pub fn parse_line(line: &str) -> Result<Coordinate, ParseError> {
    let Some((latitude, longitude)) = line.split_once(',') else {
        return Err(ParseError::Malformed(line.to_string()));
    };

    let latitude = latitude.trim().parse::<f64>().map_err(|_| ParseError::Malformed(line.to_string()))?;
    let longitude = longitude.trim().parse::<f64>().map_err(|_| ParseError::Malformed(line.to_string()))?;

    Ok(Coordinate::new(latitude, longitude)?)
}

/// Reads positions line by line and pushes them to the dispatcher until the input ends.
///
/// Empty lines and lines starting with `#` are ignored, invalid lines are logged and skipped. Returns the
/// number of samples forwarded.
#[instrument(skip(reader, tx))]
pub async fn read_positions<R>(reader: R, vehicle_id: &str, tx: Sender<PositionSample>) -> Result<usize, SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = LinesStream::new(reader.lines());
    let mut forwarded = 0;

    while let Some(line) = lines.next().await {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_line(line) {
            Ok(coordinate) => {
                tx.send(PositionSample::new(vehicle_id, coordinate))
                    .await
                    .map_err(|_| SourceError::DispatcherClosed)?;
                forwarded += 1;
            }
            Err(e) => warn!("⚠️ Skipping position: {}", e),
        }
    }

    info!("📍 Forwarded {} position(s)", forwarded);
    Ok(forwarded)
}
