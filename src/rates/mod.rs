//! Birth-death rate models over a phylogeny.
//!
//! # Layers
//! * [TreeWithRates] - gain, loss and duplication rates plus edge lengths,
//!   uniform or per edge, and an optional root distribution
//! * [ScaledModel] - a view multiplying the four quantities by constants
//! * [RateVariation] - discretized rate variation: a finite mixture of
//!   scaled models over one shared [TreeWithRates]
//! * [transient] - closed-form family size distributions per edge
//! * [rate_file] - reading and writing all of the above
//!
//! # Example
//! ```
//! use phylocount::newick::parse_str;
//! use phylocount::rates::{RateVariation, TreeWithRates, transient::transient1};
//!
//! let tree = parse_str("((A:1,B:1):1,C:2);").unwrap();
//! let mut variation = RateVariation::new(TreeWithRates::new(tree));
//! variation.set_discretization_duplication(2, 1.0).unwrap();
//!
//! for class in (0..variation.num_classes()).filter(|&c| variation.is_pertinent_class(c)) {
//!     let model = variation.class_model(class).unwrap();
//!     let inparalogs = transient1(&model, 0, 0.0).unwrap();
//!     let total: f64 = inparalogs.pmf_range(200).iter().sum();
//!     assert!((total - 1.0).abs() < 1e-9);
//! }
//! ```

pub mod discrete_gamma;
pub mod distribution;
pub mod error;
pub mod model;
pub mod rate_file;
pub mod scaled;
pub mod transient;
pub mod variation;

pub use distribution::{Distribution, DistributionFamily};
pub use error::{ModelError, RateFileError, VariationError};
pub use model::{BirthDeathModel, TreeWithRates};
pub use rate_file::{read_rates, read_rates_file, write_rates, write_rates_file};
pub use scaled::{ScaledModel, Scaling};
pub use variation::{RateClass, RateDimension, RateVariation};
