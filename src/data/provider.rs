use crate::error::{EvotradeError, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// External market-data collaborator. Implementations may hit the network,
/// disk, or memory; the engine only sees this contract.
pub trait MarketDataProvider: Send + Sync {
    fn fetch(&self, symbols: &[String], period: &str, interval: &str) -> Result<DataFrame>;
}

/// CSV-backed provider for offline runs and tests. Files are laid out as
/// `<root>/<SYMBOL>_<period>_<interval>.csv` with OHLCV columns.
pub struct CsvProvider {
    root: PathBuf,
}

impl CsvProvider {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn load(path: &Path) -> Result<DataFrame> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| EvotradeError::DataUnavailable(format!("{}: {}", path.display(), e)))?
            .finish()
            .map_err(|e| EvotradeError::DataUnavailable(format!("{}: {}", path.display(), e)))?;
        Ok(df)
    }
}

impl MarketDataProvider for CsvProvider {
    fn fetch(&self, symbols: &[String], period: &str, interval: &str) -> Result<DataFrame> {
        let symbol = symbols
            .first()
            .ok_or_else(|| EvotradeError::DataUnavailable("no symbols requested".to_string()))?;
        let path = self
            .root
            .join(format!("{}_{}_{}.csv", symbol, period, interval));

        let df = Self::load(&path)?;
        validate_price_frame(&df)?;
        Ok(df)
    }
}

/// Check that a frame can feed a backtest: a numeric `close` column and at
/// least one row. Nulls are tolerated with a warning.
pub fn validate_price_frame(df: &DataFrame) -> Result<()> {
    if df.height() == 0 {
        return Err(EvotradeError::DataUnavailable(
            "price frame is empty".to_string(),
        ));
    }

    let close = df
        .column("close")
        .map_err(|_| EvotradeError::DataUnavailable("missing 'close' column".to_string()))?;

    let null_count = close.null_count();
    if null_count > 0 {
        log::warn!("'close' column contains {} null values", null_count);
    }

    Ok(())
}

/// Extract the close column as a contiguous f64 vector for metric math.
pub fn close_prices(df: &DataFrame) -> Result<Vec<f64>> {
    let close = df
        .column("close")?
        .cast(&DataType::Float64)?;
    let values = close
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn test_validate_accepts_ohlcv_frame() {
        let frame = df! {
            "open" => &[100.0, 101.0],
            "high" => &[101.0, 102.0],
            "low" => &[99.0, 100.0],
            "close" => &[100.5, 101.5],
            "volume" => &[1000.0, 1100.0],
        }
        .unwrap();
        assert!(validate_price_frame(&frame).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_close() {
        let frame = df! { "open" => &[100.0, 101.0] }.unwrap();
        assert!(validate_price_frame(&frame).is_err());
    }

    #[test]
    fn test_close_prices_roundtrip() {
        let frame = df! { "close" => &[100.0, 101.0, 99.5] }.unwrap();
        let closes = close_prices(&frame).unwrap();
        assert_eq!(closes, vec![100.0, 101.0, 99.5]);
    }
}
