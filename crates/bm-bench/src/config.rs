use std::str::FromStr;

use bm_matrix::TileSize;

use crate::error::{BenchError, Result};

pub const USAGE: &str = "\
Usage: bm-bench [-m ROWS] [-n INNER] [-q COLS] [-a ROW_TILE] [-b COL_TILE]
                [-x MAX_VALUE] [-s SEED] [-t THREADS] [-p PRINT_LEN]

Multiply matrix A (m rows, n columns) with matrix B (n rows, q columns),
splitting A along its rows by a and along its columns by b. A tile size
of zero or less disables splitting on that axis.

  -m  rows of A and of the result              (default 1000)
  -n  columns of A and rows of B               (default 1000)
  -q  columns of B and of the result           (default 1000)
  -a  row tile edge                            (default 250)
  -b  column tile edge                         (default 250)
  -x  upper bound of the random values         (default 9)
  -s  random seed                              (default 11)
  -t  worker threads                           (default: all cores)
  -p  rows/cols shown when printing matrices   (default 4, 0 hides)
  -h  show this help

Values may follow the flag directly (-m4) or as the next argument (-m 4).
Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostic output on stderr.";

/// Settings for one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Rows of the left operand and the result.
    pub m: usize,
    /// Shared inner dimension.
    pub n: usize,
    /// Columns of the right operand and the result.
    pub q: usize,
    /// Raw row split; non-positive disables splitting.
    pub row_split: i64,
    /// Raw column split; non-positive disables splitting.
    pub col_split: i64,
    /// Random values are drawn from `[0, max_value)`.
    pub max_value: f32,
    pub seed: u64,
    /// Worker threads, or `None` for the rayon default.
    pub threads: Option<usize>,
    /// How many rows and columns of each matrix to print.
    pub print_len: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            m: 1000,
            n: 1000,
            q: 1000,
            row_split: 250,
            col_split: 250,
            max_value: 9.0,
            seed: 11,
            threads: None,
            print_len: 4,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(BenchConfig),
    Help,
}

fn parse_value<T: FromStr>(flag: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| BenchError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn positive(flag: &str, value: &str) -> Result<usize> {
    let v: usize = parse_value(flag, value)?;
    if v == 0 {
        return Err(BenchError::InvalidValue {
            flag: flag.to_string(),
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(v)
}

impl BenchConfig {
    pub fn row_tile(&self) -> TileSize {
        TileSize::from_split(self.row_split)
    }

    pub fn col_tile(&self) -> TileSize {
        TileSize::from_split(self.col_split)
    }

    /// Parse command-line arguments, not including the program name.
    pub fn parse<I, S>(args: I) -> Result<Command>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = BenchConfig::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            if arg == "-h" || arg == "--help" {
                return Ok(Command::Help);
            }
            let mut chars = arg.chars();
            let flag = match (chars.next(), chars.next()) {
                (Some('-'), Some(f)) => f,
                _ => return Err(BenchError::UnknownArgument(arg)),
            };
            let flag_name = format!("-{}", flag);
            let inline = chars.as_str();
            let value = if inline.is_empty() {
                args.next()
                    .ok_or_else(|| BenchError::MissingValue(flag_name.clone()))?
            } else {
                inline.to_string()
            };

            match flag {
                'm' => config.m = positive(&flag_name, &value)?,
                'n' => config.n = positive(&flag_name, &value)?,
                'q' => config.q = positive(&flag_name, &value)?,
                'a' => config.row_split = parse_value(&flag_name, &value)?,
                'b' => config.col_split = parse_value(&flag_name, &value)?,
                'x' => {
                    let v: f32 = parse_value(&flag_name, &value)?;
                    if !v.is_finite() || v < 0.0 {
                        return Err(BenchError::InvalidValue {
                            flag: flag_name,
                            value,
                            reason: "must be a finite, non-negative number".to_string(),
                        });
                    }
                    config.max_value = v;
                }
                's' => config.seed = parse_value(&flag_name, &value)?,
                't' => config.threads = Some(positive(&flag_name, &value)?),
                'p' => config.print_len = parse_value(&flag_name, &value)?,
                _ => return Err(BenchError::UnknownArgument(arg)),
            }
        }

        config.check_sizes()?;
        Ok(Command::Run(config))
    }

    /// Reject dimensions whose element count overflows `usize`.
    fn check_sizes(&self) -> Result<()> {
        for (rows, cols) in [(self.m, self.n), (self.n, self.q), (self.m, self.q)] {
            if rows.checked_mul(cols).is_none() {
                return Err(BenchError::TooLarge { rows, cols });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> BenchConfig {
        match BenchConfig::parse(args.iter().copied()).unwrap() {
            Command::Run(c) => c,
            Command::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_defaults() {
        let c = run(&[]);
        assert_eq!(c, BenchConfig::default());
        assert_eq!(c.row_tile(), TileSize::new(250));
    }

    #[test]
    fn test_separate_and_inline_values() {
        let c = run(&["-m", "4", "-n3", "-q", "5", "-a2", "-b", "3", "-s", "7"]);
        assert_eq!((c.m, c.n, c.q), (4, 3, 5));
        assert_eq!(c.row_tile(), TileSize::new(2));
        assert_eq!(c.col_tile(), TileSize::new(3));
        assert_eq!(c.seed, 7);
    }

    #[test]
    fn test_non_positive_split_disables_tiling() {
        let c = run(&["-a", "-1", "-b0"]);
        assert_eq!(c.row_tile(), TileSize::Whole);
        assert_eq!(c.col_tile(), TileSize::Whole);
    }

    #[test]
    fn test_threads_and_max_value() {
        let c = run(&["-t", "3", "-x", "100.5", "-p", "0"]);
        assert_eq!(c.threads, Some(3));
        assert_eq!(c.max_value, 100.5);
        assert_eq!(c.print_len, 0);
    }

    #[test]
    fn test_help() {
        assert_eq!(BenchConfig::parse(["-h"]).unwrap(), Command::Help);
    }

    #[test]
    fn test_missing_value() {
        let err = BenchConfig::parse(["-m"]).unwrap_err();
        assert!(matches!(err, BenchError::MissingValue(f) if f == "-m"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            BenchConfig::parse(["-m", "abc"]),
            Err(BenchError::InvalidValue { .. })
        ));
        assert!(BenchConfig::parse(["-n", "0"]).is_err());
        assert!(BenchConfig::parse(["-t", "0"]).is_err());
        assert!(BenchConfig::parse(["-x", "-2"]).is_err());
        assert!(BenchConfig::parse(["-x", "inf"]).is_err());
    }

    #[test]
    fn test_unknown_argument() {
        assert!(matches!(
            BenchConfig::parse(["-z", "1"]),
            Err(BenchError::UnknownArgument(_))
        ));
        assert!(matches!(
            BenchConfig::parse(["positional"]),
            Err(BenchError::UnknownArgument(_))
        ));
    }

    #[test]
    fn test_rejects_overflowing_dimensions() {
        let big = usize::MAX.to_string();
        let err = BenchConfig::parse(["-m", big.as_str(), "-n", "2"]).unwrap_err();
        assert!(matches!(err, BenchError::TooLarge { cols: 2, .. }));
        assert!(err.to_string().contains("too large"));
    }
}
