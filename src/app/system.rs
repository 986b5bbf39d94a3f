use crate::config::Config;
use color_eyre::eyre::{Result, WrapErr};
use fock_kernel::driver::{model_density, ModelIntegrals};
use fock_kernel::BlockLayout;
use nalgebra::DMatrix;
use tracing::info;

/// Shells, integrals and density a run works on
pub struct SyntheticSystem {
    pub layout: BlockLayout,
    pub integrals: ModelIntegrals,
    pub density: DMatrix<f64>,
}

impl SyntheticSystem {
    pub fn from_config(config: &Config) -> Result<Self> {
        let dims = config.shell_dims()?;
        let layout = BlockLayout::new(&dims).wrap_err("Invalid shell list")?;
        info!(
            "Synthetic system: {} shells, {} basis functions, largest shell {}",
            layout.nshells(),
            layout.nbf(),
            layout.max_dim()
        );

        let density = model_density(layout.nbf());
        Ok(Self {
            layout,
            integrals: ModelIntegrals::default(),
            density,
        })
    }
}
