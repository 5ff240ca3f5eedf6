//! # hodmd
//!
//! Higher-order dynamic mode decomposition (HODMD) for time-resolved
//! snapshot data.
//!
//! Given a matrix whose columns are snapshots of a system and the time step
//! between them, the library extracts a small set of spatio-temporal modes
//! that approximate the evolution of the system and can reconstruct and
//! extrapolate the data from those modes:
//!
//! - **Base DMD** ([`Dmd`]): truncated-SVD operator fit with optional
//!   total-least-squares de-noising and optimal amplitudes
//! - **Higher-order DMD** ([`Hodmd`]): initial dimensionality reduction plus
//!   delay embedding on top of the base fit, with all derived quantities
//!   mapped back to the original space
//! - **Accessor contract** ([`Decomposition`]): reconstruction and errors
//!   are computed generically from overridable mode accessors
//! - **Rank reduction** ([`factorize`], [`Factorization`]): truncated SVD
//!   with automatic rank selection
//! - **Analysis** ([`spectrum`], [`stability`], [`predict`]): eigenvalue
//!   spectrum, stability classification, extrapolation
//! - **Data access** ([`Dataloader`], [`InMemoryDataloader`]): in-process
//!   snapshot-producer contract
//!
//! ## Quick Start
//!
//! ```rust
//! use hodmd::{Decomposition, Hodmd, HodmdOptions};
//!
//! // Create a simple oscillating signal
//! let n = 60;
//! let mut data = faer::Mat::<f64>::zeros(2, n);
//! for j in 0..n {
//!     let t = j as f64 * 0.1;
//!     data[(0, j)] = t.sin();
//!     data[(1, j)] = t.cos();
//! }
//!
//! // Decompose with five time delays
//! let options = HodmdOptions {
//!     delay: Some(5),
//!     ..Default::default()
//! };
//! let dmd = Hodmd::new(&data, 0.1, options).unwrap();
//!
//! // Modes and errors live in the original two-row space
//! assert_eq!(dmd.modes().len(), 2);
//! let error = dmd.reconstruction_error();
//! assert_eq!(error.nrows(), 2);
//! assert_eq!(error.ncols(), n - 5 + 1);
//! ```
//!
//! ## References
//!
//! - Le Clainche & Vega (2017), *SIAM J. Appl. Dyn. Syst.*, 16(2), 882-925
//! - Schmid (2010), *J. Fluid Mech.*, 656, 5-28
//! - Kutz et al. (2016), *Dynamic Mode Decomposition*, SIAM

pub mod analysis;
pub mod dataloader;
pub mod decomposition;
pub mod dmd;
pub mod hodmd;
pub mod svd;
pub mod types;
pub mod utils;

pub use analysis::{dominant_modes, predict, spectrum, stability};
pub use dataloader::{Dataloader, InMemoryDataloader};
pub use decomposition::Decomposition;
pub use dmd::Dmd;
pub use hodmd::{Hodmd, HodmdOptions};
pub use svd::{factorize, Factorization};
pub use types::{
    C64, DmdError, DmdOptions, DominantCriterion, ModeInfo, Stability, StabilityResult,
};
