use crate::config::ImageConfig;
use crate::constants::{DEFAULT_MEMORY_LIMIT_MB, DEFAULT_TIME_LIMIT_SECS};

/// Everything language-specific a sandbox run needs.
#[derive(Clone, Debug, PartialEq)]
pub struct LanguageProfile {
    pub image: String,
    pub source_file_name: &'static str,
    pub default_time_limit_secs: u64,
    pub default_memory_limit_mb: u64,
}

/// Resolution outcome. Unknown languages fall back to the default profile
/// instead of failing, but the substitution stays observable so callers can
/// log it and tests can assert on it.
#[derive(Clone, Debug)]
pub enum ProfileResolution {
    Known(LanguageProfile),
    Fallback {
        profile: LanguageProfile,
        requested: String,
    },
}

impl ProfileResolution {
    pub fn profile(&self) -> &LanguageProfile {
        match self {
            Self::Known(profile) => profile,
            Self::Fallback { profile, .. } => profile,
        }
    }
}

/// Static mapping from a language identifier to its sandbox profile.
/// Lookup is case-insensitive and accepts short aliases.
#[derive(Clone, Debug)]
pub struct LanguageProfileResolver {
    images: ImageConfig,
}

impl LanguageProfileResolver {
    pub fn new(images: &ImageConfig) -> Self {
        Self {
            images: images.clone(),
        }
    }

    pub fn resolve(&self, language: &str) -> ProfileResolution {
        match language.to_lowercase().as_str() {
            "cpp" | "c++" => ProfileResolution::Known(self.profile(&self.images.cpp, "main.cpp")),
            "java" => ProfileResolution::Known(self.profile(&self.images.java, "Main.java")),
            "python" | "py" => {
                ProfileResolution::Known(self.profile(&self.images.python, "main.py"))
            }
            "javascript" | "js" => {
                ProfileResolution::Known(self.profile(&self.images.javascript, "main.js"))
            }
            _ => ProfileResolution::Fallback {
                profile: self.profile(&self.images.cpp, "main.cpp"),
                requested: language.to_string(),
            },
        }
    }

    fn profile(&self, image: &str, source_file_name: &'static str) -> LanguageProfile {
        LanguageProfile {
            image: image.to_string(),
            source_file_name,
            default_time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            default_memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
        }
    }
}
