//! Pairs file format read by `coembed score`.

use anyhow::{bail, Result};
use serde::Deserialize;

/// Molecule embeddings paired row-by-row with either fixed-width protein
/// embeddings or per-residue protein sequences.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairsFile {
    pub molecules: Vec<Vec<f32>>,
    #[serde(default)]
    pub proteins: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub protein_sequences: Option<Vec<Vec<Vec<f32>>>>,
}

#[derive(Debug)]
pub enum Pairs {
    Vectors {
        molecules: Vec<Vec<f32>>,
        proteins: Vec<Vec<f32>>,
    },
    Sequences {
        molecules: Vec<Vec<f32>>,
        sequences: Vec<Vec<Vec<f32>>>,
    },
}

impl Pairs {
    pub fn parse(json: &str) -> Result<Self> {
        let file: PairsFile = serde_json::from_str(json)?;
        match (file.proteins, file.protein_sequences) {
            (Some(proteins), None) => Ok(Self::Vectors {
                molecules: file.molecules,
                proteins,
            }),
            (None, Some(sequences)) => Ok(Self::Sequences {
                molecules: file.molecules,
                sequences,
            }),
            (Some(_), Some(_)) => bail!("pairs file has both \"proteins\" and \"protein_sequences\""),
            (None, None) => bail!("pairs file needs \"proteins\" or \"protein_sequences\""),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Vectors { molecules, .. } | Self::Sequences { molecules, .. } => molecules.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_vector_pairs() {
        let pairs = Pairs::parse(r#"{"molecules": [[1.0, 0.0]], "proteins": [[0.5]]}"#).unwrap();
        assert_eq!(pairs.len(), 1);
        match pairs {
            Pairs::Vectors { proteins, .. } => assert_eq!(proteins, vec![vec![0.5]]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_sequence_pairs() {
        let json = r#"{"molecules": [[1.0], [2.0]], "protein_sequences": [[[0.1], [0.2]], [[0.3]]]}"#;
        match Pairs::parse(json).unwrap() {
            Pairs::Sequences { sequences, .. } => {
                assert_eq!(sequences.len(), 2);
                assert_eq!(sequences[0].len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ambiguous_or_missing_proteins() {
        assert!(Pairs::parse(r#"{"molecules": []}"#).is_err());
        assert!(Pairs::parse(r#"{"molecules": [], "proteins": [], "protein_sequences": []}"#).is_err());
        assert!(Pairs::parse(r#"{"molecules": [], "prots": []}"#).is_err());
    }
}
