//! Signal Registry
//!
//! Immutable lookup from signal source to decoder.

use crate::domain::error::{DecodeError, RegistryError};
use crate::domain::gestures::{self, Decoder};
use crate::domain::models::SignalSource;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Registry {
    decoders: HashMap<SignalSource, Decoder>,
}

impl Registry {
    /// Build a registry from explicit entries, rejecting duplicates
    pub fn new(
        entries: impl IntoIterator<Item = (SignalSource, Decoder)>,
    ) -> Result<Self, RegistryError> {
        let mut decoders = HashMap::new();
        for (source, decoder) in entries {
            if decoders.insert(source, decoder).is_some() {
                return Err(RegistryError::Duplicate(source));
            }
        }
        Ok(Self { decoders })
    }

    /// Registry with the standard decoder for each given source
    pub fn for_sources(sources: &[SignalSource]) -> Result<Self, RegistryError> {
        Self::new(sources.iter().map(|s| (*s, gestures::decoder_for(*s))))
    }

    /// Registry covering all five known sources
    pub fn standard() -> Self {
        Self {
            decoders: SignalSource::ALL
                .into_iter()
                .map(|s| (s, gestures::decoder_for(s)))
                .collect(),
        }
    }

    pub fn lookup(&self, source: SignalSource) -> Result<Decoder, DecodeError> {
        self.decoders
            .get(&source)
            .copied()
            .ok_or(DecodeError::UnknownSource(source))
    }

    /// Registered sources in a stable order
    pub fn sources(&self) -> Vec<SignalSource> {
        let mut sources: Vec<_> = self.decoders.keys().copied().collect();
        sources.sort();
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Gesture;

    #[test]
    fn test_standard_covers_all_sources() {
        let registry = Registry::standard();
        assert_eq!(registry.sources(), SignalSource::ALL.to_vec());
        let decode = registry.lookup(SignalSource::Button).unwrap();
        assert_eq!(decode(&[1]).unwrap(), Some(Gesture::ButtonPress));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = Registry::for_sources(&[SignalSource::Touch, SignalSource::Touch]);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::Duplicate(SignalSource::Touch)
        );
    }

    #[test]
    fn test_unregistered_source() {
        let registry = Registry::for_sources(&[SignalSource::Button]).unwrap();
        assert!(registry.lookup(SignalSource::Button).is_ok());
        assert_eq!(
            registry.lookup(SignalSource::Battery).unwrap_err(),
            DecodeError::UnknownSource(SignalSource::Battery)
        );
    }
}
