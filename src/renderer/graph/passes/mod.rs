//! Built-in Post Effects
//!
//! | Effect | Programs | Persistent resources |
//! |--------|----------|----------------------|
//! | [`GtaoPass`] | `GTAO` | 7 AO intermediates + history |
//! | [`EdgeDetectionPass`] | `EdgeDetection` | none |
//! | [`DifferenceOfGaussiansPass`] | `DifferenceOfGaussians` | `DoG_Gaussian2` |
//! | [`ExtendedDogPass`] | `ExtendedDifferenceOfGaussians` | `_EigenVectors2`, `_DifferenceOfGaussians` |
//! | [`AutoExposurePass`] | `LogHistogram`, `AutoExposure`, `AutoExposureApply` | exposure, histogram |
//! | [`ToneMappingPass`] | `ToneMapping` | none |

pub mod auto_exposure;
pub mod dog;
pub mod edge_detection;
pub mod extended_dog;
pub mod gtao;
pub mod tone_mapping;

pub use auto_exposure::{AutoExposurePass, AutoExposureState};
pub use dog::DifferenceOfGaussiansPass;
pub use edge_detection::EdgeDetectionPass;
pub use extended_dog::ExtendedDogPass;
pub use gtao::{GtaoPass, GtaoState};
pub use tone_mapping::ToneMappingPass;
