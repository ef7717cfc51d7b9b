use anyhow::{anyhow, Result};

pub fn validate_contamination(value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 0.5) {
        return Err(anyhow!("contamination must be in (0, 0.5], got {}", value));
    }
    Ok(())
}

pub fn validate_fraction(name: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(anyhow!("{} must be in (0, 1), got {}", name, value));
    }
    Ok(())
}
