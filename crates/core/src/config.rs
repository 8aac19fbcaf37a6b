use std::env;
use crate::error::{StudioError, Result};
use crate::pixel_buffer::MAX_WORKING_DIMENSION;
use dotenvy::dotenv;

/// Default SKU prefix for materialized products.
pub const DEFAULT_SKU_PREFIX: &str = "ELN";

/// Default product name for single-product materialization.
pub const DEFAULT_COLLECTION_NAME: &str = "Custom Collection";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub sku_prefix: String,
    pub collection_name: String,
    pub max_working_dimension: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let sku_prefix = env::var("STUDIO_SKU_PREFIX")
            .unwrap_or_else(|_| DEFAULT_SKU_PREFIX.to_string());

        let collection_name = env::var("STUDIO_COLLECTION_NAME")
            .unwrap_or_else(|_| DEFAULT_COLLECTION_NAME.to_string());

        let max_working_dimension = match env::var("STUDIO_MAX_WORKING_DIM") {
            Ok(raw) => parse_dimension(&raw)?,
            Err(_) => MAX_WORKING_DIMENSION,
        };

        Ok(Self {
            sku_prefix,
            collection_name,
            max_working_dimension,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sku_prefix: DEFAULT_SKU_PREFIX.to_string(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            max_working_dimension: MAX_WORKING_DIMENSION,
        }
    }
}

fn parse_dimension(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(StudioError::config("STUDIO_MAX_WORKING_DIM must be greater than zero")),
        Ok(dim) => Ok(dim),
        Err(e) => Err(StudioError::Config(format!(
            "STUDIO_MAX_WORKING_DIM must be a positive integer, got '{}': {}",
            raw, e
        ))),
    }
}
