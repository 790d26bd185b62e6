//! System-wide constants and default directory names.

use crate::types::Category;

/// Default directory (relative to the root) holding command modules.
pub const DEFAULT_COMMAND_DIR: &str = "commands";
/// Default directory holding configuration documents.
pub const DEFAULT_CONFIG_DIR: &str = "configs";
/// Default directory holding environment definitions.
pub const DEFAULT_ENVIRONMENT_DIR: &str = "environments";
/// Default directory holding factory modules.
pub const DEFAULT_FACTORY_DIR: &str = "factories";
/// Default directory holding helper modules.
pub const DEFAULT_HELPER_DIR: &str = "helpers";
/// Default directory holding service modules.
pub const DEFAULT_SERVICE_DIR: &str = "services";
/// Default directory holding test modules.
pub const DEFAULT_TEST_DIR: &str = "tests";

/// Returns the default directory name for a category.
#[must_use]
pub const fn default_dir(category: Category) -> &'static str {
    match category {
        Category::Command => DEFAULT_COMMAND_DIR,
        Category::Config => DEFAULT_CONFIG_DIR,
        Category::Environment => DEFAULT_ENVIRONMENT_DIR,
        Category::Factory => DEFAULT_FACTORY_DIR,
        Category::Helper => DEFAULT_HELPER_DIR,
        Category::Service => DEFAULT_SERVICE_DIR,
        Category::Test => DEFAULT_TEST_DIR,
    }
}

/// Separator between the category and the body of a dependency reference.
pub const REFERENCE_SEPARATOR: &str = "::";

/// Prefix marking a method as private; such methods cannot be setters.
pub const PRIVATE_PREFIX: char = '_';

/// Extension of data documents (configs, environments) read from disk.
pub const DATA_EXTENSION: &str = "json";

/// Environment variable overriding the application root.
pub const ROOT_ENV_VAR: &str = "KESTREL_ROOT";

/// Application name used in CLI output.
pub const APP_NAME: &str = "kestrel";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "kestrel";
