pub type HeroResult<T> = Result<T, HeroError>;

#[derive(thiserror::Error, Debug)]
pub enum HeroError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HeroError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            HeroError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            HeroError::template("x")
                .to_string()
                .contains("template error:")
        );
        assert!(HeroError::raster("x").to_string().contains("raster error:"));
        assert!(HeroError::encode("x").to_string().contains("encode error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("disk full");
        let err = HeroError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("disk full"));
    }
}
