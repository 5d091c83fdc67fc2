use crate::*;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;

/// Everything needed to resume tracing from an accepted point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub y: Vec<f64>,
    /// Canonical tangent at `y`, if already known.
    pub tangent: Option<Vec<f64>>,
    /// Direction of travel along the canonical tangent, `+1` or `-1`.
    pub sign: i8,
    /// Arc length travelled so far.
    pub s: ArcLength,
    pub step: usize,
    /// Step size of the next predictor.
    pub ds: ArcLength,
}

impl Checkpoint {
    /// Homotopy parameter at this point.
    pub fn t(&self) -> Parameter {
        self.y.last().copied().unwrap_or(f64::NAN)
    }

    /// Reasons this checkpoint cannot belong to a state vector of dimension `dim`.
    pub fn check(&self, dim: usize) -> Result<(), String> {
        if self.y.len() != dim {
            return Err(format!("state vector has {} entries, expected {}", self.y.len(), dim));
        }
        if self.y.iter().any(|x| !x.is_finite()) {
            return Err("state vector holds non-finite entries".to_string());
        }
        if let Some(ref tangent) = self.tangent {
            if tangent.len() != dim {
                return Err(format!("tangent has {} entries, expected {}", tangent.len(), dim));
            }
            if tangent.iter().any(|x| !x.is_finite()) {
                return Err("tangent holds non-finite entries".to_string());
            }
        }
        if self.sign != 1 && self.sign != -1 {
            return Err(format!("sign must be +1 or -1, got {}", self.sign));
        }
        if !(self.s.is_finite() && self.ds.is_finite() && self.ds > 0.) {
            return Err(format!("invalid arc length {} or step size {}", self.s, self.ds));
        }
        Ok(())
    }
}

/// On-disk form of a tracker session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub format: String,
    pub version: u32,
    pub homotopy: String,
    pub dim: usize,
    pub status: Status,
    pub checkpoint: Checkpoint,
    pub settings: Settings,
}

impl Snapshot {
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let io = |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::create(path).map_err(io)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|source| PersistenceError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        std::io::Write::flush(&mut writer).map_err(io)
    }

    /// Read and check a snapshot against the tracker that will receive it.
    pub fn load(path: &Path, homotopy: &str, dim: usize) -> Result<Self, PersistenceError> {
        let file = std::fs::File::open(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = serde_json::from_reader::<_, Self>(std::io::BufReader::new(file)).map_err(|source| {
            PersistenceError::Malformed {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let schema = |reason: String| PersistenceError::Schema {
            path: path.to_path_buf(),
            reason,
        };
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(schema(format!("unknown format '{}'", snapshot.format)));
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(schema(format!("unsupported version {}", snapshot.version)));
        }
        if snapshot.homotopy != homotopy {
            return Err(schema(format!("saved by a '{}' homotopy, not '{}'", snapshot.homotopy, homotopy)));
        }
        if snapshot.dim != dim {
            return Err(schema(format!("dimension {} does not match {}", snapshot.dim, dim)));
        }
        snapshot.checkpoint.check(dim).map_err(schema)?;
        snapshot.settings.check().map_err(schema)?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint() -> Checkpoint {
        Checkpoint {
            y: vec![0.5, 0.5, 0.1],
            tangent: None,
            sign: 1,
            s: 0.,
            step: 0,
            ds: 0.01,
        }
    }

    #[test]
    fn rejects_bad_sign() {
        let mut c = checkpoint();
        c.sign = 0;
        assert!(c.check(3).is_err());
        assert!(checkpoint().check(3).is_ok());
        assert!(checkpoint().check(4).is_err());
    }

    #[test]
    fn t_is_last_entry() {
        assert_eq!(checkpoint().t(), 0.1);
    }
}
