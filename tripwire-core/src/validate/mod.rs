mod validator;

use crate::config::TripwireConfig;
use crate::error::ValidationError;
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for TripwireConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_config(self)
    }
}

pub fn validate_config(cfg: &TripwireConfig) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_config(cfg);
    v.finish()
}
