/// Geometry/drag dataset loaded from NumPy .npy files
use ndarray::{Array1, Array2, ArrayD, Axis, Ix2, Ix3};
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Fraction of samples used for training when no split is recorded
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Metadata from dataset.json
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatasetMetadata {
    /// First index of the test suffix
    #[serde(default)]
    pub split_line: Option<usize>,
    #[serde(default)]
    pub description: String,
}

/// One geometry mask and its drag vector
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Single-channel mask [height, width]
    pub geometry: Array2<f32>,
    /// Drag values; the last component is the regression target
    pub drag: Array1<f32>,
}

impl Sample {
    pub fn new(geometry: Array2<f32>, drag: Array1<f32>) -> Self {
        Self { geometry, drag }
    }

    /// Regression target (last drag component)
    pub fn target(&self) -> Option<f32> {
        self.drag.last().copied()
    }
}

/// Ordered samples plus the index separating train from test
#[derive(Debug, Clone)]
pub struct DragDataset {
    samples: Vec<Sample>,
    split_line: usize,
    metadata: DatasetMetadata,
}

impl DragDataset {
    /// Build from in-memory samples
    ///
    /// All geometries must share one shape. The split line is kept as given.
    pub fn from_samples(samples: Vec<Sample>, split_line: usize) -> crate::Result<Self> {
        if let Some(first) = samples.first() {
            let shape = first.geometry.dim();
            for (idx, sample) in samples.iter().enumerate() {
                if sample.geometry.dim() != shape {
                    return Err(crate::DragError::Data(format!(
                        "Sample {} geometry shape {:?} != {:?}",
                        idx,
                        sample.geometry.dim(),
                        shape
                    )));
                }
            }
        }

        Ok(Self {
            samples,
            split_line,
            metadata: DatasetMetadata {
                split_line: Some(split_line),
                description: String::new(),
            },
        })
    }

    /// Load from directory containing geometries.npy, drag_vectors.npy and
    /// an optional dataset.json
    pub fn from_directory<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let dir = path.as_ref();

        log::info!("Loading drag dataset from: {:?}", dir);

        // Load metadata
        let metadata_path = dir.join("dataset.json");
        let metadata: DatasetMetadata = if metadata_path.exists() {
            let file = File::open(&metadata_path)?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader)?
        } else {
            log::warn!("dataset.json not found, using defaults");
            DatasetMetadata::default()
        };

        let geometries = read_float_array(&dir.join("geometries.npy"))?;
        log::info!("Loaded geometries: shape {:?}", geometries.shape());

        let geometries = match geometries.ndim() {
            3 => geometries.into_dimensionality::<Ix3>()?,
            4 if geometries.shape()[3] == 1 => geometries
                .index_axis_move(Axis(3), 0)
                .into_dimensionality::<Ix3>()?,
            _ => {
                return Err(crate::DragError::Data(format!(
                    "geometries.npy must be [N, H, W] or [N, H, W, 1], got {:?}",
                    geometries.shape()
                )))
            }
        };

        let drag_vectors = read_float_array(&dir.join("drag_vectors.npy"))?;
        log::info!("Loaded drag vectors: shape {:?}", drag_vectors.shape());

        let drag_vectors = match drag_vectors.ndim() {
            2 => drag_vectors.into_dimensionality::<Ix2>()?,
            _ => {
                return Err(crate::DragError::Data(format!(
                    "drag_vectors.npy must be [N, K], got {:?}",
                    drag_vectors.shape()
                )))
            }
        };

        // Validate shapes
        if geometries.len_of(Axis(0)) != drag_vectors.nrows() {
            return Err(crate::DragError::Data(format!(
                "Sample count mismatch: geometries {:?} vs drag_vectors {:?}",
                geometries.shape(),
                drag_vectors.shape()
            )));
        }

        if drag_vectors.ncols() == 0 {
            return Err(crate::DragError::Data(
                "drag_vectors.npy has empty drag vectors".to_string(),
            ));
        }

        let samples: Vec<Sample> = geometries
            .outer_iter()
            .zip(drag_vectors.outer_iter())
            .map(|(geometry, drag)| Sample::new(geometry.to_owned(), drag.to_owned()))
            .collect();

        let split_line = match metadata.split_line {
            Some(split_line) => split_line,
            None => {
                let split_line = (samples.len() as f64 * DEFAULT_TRAIN_FRACTION).floor() as usize;
                log::warn!(
                    "No split_line recorded, using {} ({}% of {} samples)",
                    split_line,
                    DEFAULT_TRAIN_FRACTION * 100.0,
                    samples.len()
                );
                split_line
            }
        };

        log::info!(
            "Dataset loaded: {} samples, geometry={:?}, split_line={}",
            samples.len(),
            samples.first().map(|s| s.geometry.dim()),
            split_line
        );

        Ok(Self {
            samples,
            split_line,
            metadata,
        })
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First index of the test suffix
    pub fn split_line(&self) -> usize {
        self.split_line
    }

    /// Shared geometry shape (height, width), if any sample exists
    pub fn geometry_shape(&self) -> Option<(usize, usize)> {
        self.samples.first().map(|s| s.geometry.dim())
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn sample(&self, idx: usize) -> Option<&Sample> {
        self.samples.get(idx)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// Read an f32 array, accepting f64 files (NumPy's default float)
fn read_float_array(path: &Path) -> crate::Result<ArrayD<f32>> {
    match ArrayD::<f32>::read_npy(File::open(path)?) {
        Ok(array) => Ok(array),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            let wide = ArrayD::<f64>::read_npy(File::open(path)?)?;
            Ok(wide.mapv(|x| x as f32))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Array3};
    use ndarray_npy::WriteNpyExt;

    fn write_npy<A: WriteNpyExt>(path: &Path, array: &A) {
        let file = File::create(path).unwrap();
        array.write_npy(file).unwrap();
    }

    #[test]
    fn test_metadata_deserialization() {
        let json = r#"{
            "split_line": 120,
            "description": "cylinder sweep"
        }"#;

        let metadata: DatasetMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.split_line, Some(120));
        assert_eq!(metadata.description, "cylinder sweep");

        let metadata: DatasetMetadata = serde_json::from_str("{}").unwrap();
        assert_eq!(metadata.split_line, None);
    }

    #[test]
    fn test_from_samples_rejects_mixed_shapes() {
        let samples = vec![
            Sample::new(Array2::zeros((4, 4)), Array1::from(vec![1.0])),
            Sample::new(Array2::zeros((4, 5)), Array1::from(vec![2.0])),
        ];
        assert!(DragDataset::from_samples(samples, 1).is_err());
    }

    #[test]
    fn test_target_is_last_component() {
        let sample = Sample::new(Array2::zeros((2, 2)), Array1::from(vec![0.1, 0.2, 0.7]));
        assert_eq!(sample.target(), Some(0.7));
    }

    #[test]
    fn test_from_directory_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let geometries = Array::from_shape_fn((5, 6, 6), |(n, i, j)| (n + i * j) as f32);
        let drags = Array::from_shape_fn((5, 3), |(n, k)| (n * 10 + k) as f32);
        write_npy(&dir.path().join("geometries.npy"), &geometries);
        write_npy(&dir.path().join("drag_vectors.npy"), &drags);
        std::fs::write(
            dir.path().join("dataset.json"),
            r#"{"split_line": 3, "description": "tiny"}"#,
        )
        .unwrap();

        let dataset = DragDataset::from_directory(dir.path()).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.split_line(), 3);
        assert_eq!(dataset.geometry_shape(), Some((6, 6)));
        assert_eq!(dataset.sample(4).unwrap().target(), Some(42.0));
        assert_eq!(dataset.metadata().description, "tiny");
    }

    #[test]
    fn test_from_directory_f64_and_channel_axis() {
        let dir = tempfile::tempdir().unwrap();
        let geometries: Array<f64, _> = Array::ones((10, 4, 4, 1));
        let drags: Array2<f64> = Array::from_elem((10, 2), 0.5);
        write_npy(&dir.path().join("geometries.npy"), &geometries);
        write_npy(&dir.path().join("drag_vectors.npy"), &drags);

        let dataset = DragDataset::from_directory(dir.path()).unwrap();
        assert_eq!(dataset.len(), 10);
        // no dataset.json: default split
        assert_eq!(dataset.split_line(), 8);
        assert_eq!(dataset.sample(0).unwrap().geometry, Array2::<f32>::ones((4, 4)));
    }

    #[test]
    fn test_from_directory_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DragDataset::from_directory(dir.path()).is_err());

        let geometries: Array3<f32> = Array::zeros((3, 4, 4));
        let drags: Array2<f32> = Array::zeros((2, 1));
        write_npy(&dir.path().join("geometries.npy"), &geometries);
        write_npy(&dir.path().join("drag_vectors.npy"), &drags);
        assert!(matches!(
            DragDataset::from_directory(dir.path()),
            Err(crate::DragError::Data(_))
        ));
    }
}
