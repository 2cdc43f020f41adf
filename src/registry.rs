//! Output registry
//!
//! Maps output ids to their configuration and the pixel buffer acquired for
//! them. The registry is a fixed arena with one slot per supported pin, so it
//! never allocates.

use heapless::Vec;
use log::{debug, error, info};

use crate::config::{OutputConfig, Pin};
use crate::driver::{OutputDriver, PixelBuffer};
use crate::error::ConfigError;

/// Most outputs that can be live at once, one per pin
pub const MAX_OUTPUTS: usize = Pin::COUNT;

/// A configured output and the buffer that drives it
#[derive(Debug)]
pub struct Output<B> {
    config: OutputConfig,
    buffer: B,
}

impl<B> Output<B> {
    pub const fn config(&self) -> &OutputConfig {
        &self.config
    }

    pub const fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }
}

/// Registry of live outputs
pub struct OutputRegistry<D: OutputDriver> {
    driver: D,
    outputs: Vec<Output<D::Buffer>, MAX_OUTPUTS>,
}

impl<D: OutputDriver> OutputRegistry<D> {
    pub const fn new(driver: D) -> Self {
        Self {
            driver,
            outputs: Vec::new(),
        }
    }

    /// Apply a single output config.
    ///
    /// The previous buffer of the output is released before the new one is
    /// acquired, so the output may be re-pinned. Nothing changes if the
    /// config is invalid. If the new buffer cannot be acquired the previous
    /// config is restored.
    pub fn apply_config(&mut self, config: OutputConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if let Some(owner) = self
            .outputs
            .iter()
            .find(|output| output.config.pin == config.pin)
            .filter(|output| output.config.output_id != config.output_id)
        {
            return Err(ConfigError::PinInUse {
                pin: config.pin,
                owner: owner.config.output_id.clone(),
            });
        }

        let previous = match self.position(&config.output_id) {
            Some(index) => {
                let previous = self.outputs.swap_remove(index);
                debug!(
                    "releasing pin {} of output {}",
                    previous.config.pin, previous.config.output_id
                );
                self.driver.release(previous.buffer);
                Some(previous.config)
            }
            None if self.outputs.is_full() => {
                return Err(ConfigError::RegistryFull(config.output_id));
            }
            None => None,
        };

        match self.acquire(&config) {
            Ok(buffer) => self.insert(Output { config, buffer }),
            Err(err) => {
                if let Some(previous) = previous {
                    self.restore(&previous);
                }
                Err(err)
            }
        }
    }

    /// Replace the whole registry with `configs`.
    ///
    /// The batch is validated up front and rejected as a whole. Once it is
    /// accepted every current buffer is released, then each config is
    /// acquired in order. If any buffer cannot be acquired, everything
    /// acquired so far is released again and the previous outputs are
    /// restored.
    pub fn apply_config_batch(&mut self, configs: &[OutputConfig]) -> Result<(), ConfigError> {
        validate_batch(configs)?;

        let previous: Vec<OutputConfig, MAX_OUTPUTS> = self
            .outputs
            .iter()
            .map(|output| output.config.clone())
            .collect();
        self.release_all();

        for config in configs {
            let result = self.acquire(config).and_then(|buffer| {
                self.insert(Output {
                    config: config.clone(),
                    buffer,
                })
            });
            if let Err(err) = result {
                self.release_all();
                for config in &previous {
                    self.restore(config);
                }
                return Err(err);
            }
        }
        info!("applied {} output configs", configs.len());

        Ok(())
    }

    /// Remove an output and release its buffer.
    ///
    /// Returns false if the output was not configured.
    pub fn remove(&mut self, output_id: &str) -> bool {
        let Some(index) = self.position(output_id) else {
            return false;
        };
        let output = self.outputs.swap_remove(index);
        self.driver.release(output.buffer);
        true
    }

    /// Change the gain of a live output without reacquiring its buffer
    pub fn set_brightness(&mut self, output_id: &str, brightness: u8) -> Result<(), ConfigError> {
        let output = self
            .lookup_mut(output_id)
            .ok_or_else(|| ConfigError::UnknownOutput(output_id.into()))?;
        let mut config = output.config.clone();
        config.brightness = brightness;
        config.validate()?;

        output.buffer.set_brightness(brightness);
        output.config = config;
        Ok(())
    }

    pub fn lookup(&self, output_id: &str) -> Option<&Output<D::Buffer>> {
        self.outputs
            .iter()
            .find(|output| output.config.output_id == output_id)
    }

    pub fn lookup_mut(&mut self, output_id: &str) -> Option<&mut Output<D::Buffer>> {
        self.outputs
            .iter_mut()
            .find(|output| output.config.output_id == output_id)
    }

    pub fn contains(&self, output_id: &str) -> bool {
        self.position(output_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Configs of every live output
    pub fn configs(&self) -> impl Iterator<Item = &OutputConfig> {
        self.outputs.iter().map(|output| &output.config)
    }

    pub const fn driver(&self) -> &D {
        &self.driver
    }

    fn position(&self, output_id: &str) -> Option<usize> {
        self.outputs
            .iter()
            .position(|output| output.config.output_id == output_id)
    }

    fn acquire(&mut self, config: &OutputConfig) -> Result<D::Buffer, ConfigError> {
        self.driver
            .acquire(config.pin, config.leds, config.brightness)
            .map_err(|source| {
                error!(
                    "capability acquisition failed for output {} on pin {}: {}",
                    config.output_id, config.pin, source
                );
                ConfigError::AcquisitionFailed {
                    output_id: config.output_id.clone(),
                    source,
                }
            })
    }

    /// Reacquire a config that was live before a failed change
    fn restore(&mut self, config: &OutputConfig) {
        let restored = self.acquire(config).and_then(|buffer| {
            self.insert(Output {
                config: config.clone(),
                buffer,
            })
        });
        if let Err(err) = restored {
            error!("failed to restore output {}: {}", config.output_id, err);
        }
    }

    fn release_all(&mut self) {
        while let Some(output) = self.outputs.pop() {
            self.driver.release(output.buffer);
        }
    }

    fn insert(&mut self, output: Output<D::Buffer>) -> Result<(), ConfigError> {
        if let Err(output) = self.outputs.push(output) {
            let output_id = output.config.output_id.clone();
            self.driver.release(output.buffer);
            return Err(ConfigError::RegistryFull(output_id));
        }
        Ok(())
    }
}

/// Check every config of a batch and the uniqueness of ids and pins
fn validate_batch(configs: &[OutputConfig]) -> Result<(), ConfigError> {
    for (index, config) in configs.iter().enumerate() {
        config.validate()?;
        let earlier = &configs[..index];
        if earlier.iter().any(|other| other.output_id == config.output_id) {
            return Err(ConfigError::DuplicateOutput(config.output_id.clone()));
        }
        if let Some(owner) = earlier.iter().find(|other| other.pin == config.pin) {
            return Err(ConfigError::PinInUse {
                pin: config.pin,
                owner: owner.output_id.clone(),
            });
        }
    }
    Ok(())
}
