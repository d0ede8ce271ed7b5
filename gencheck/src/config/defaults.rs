//! Default configuration values - single source of truth

/// Environment variable holding the toolchain root
pub const TOOLCHAIN_ROOT_VAR: &str = "GOPATH";

/// Environment variable holding the database host
pub const DATABASE_HOST_VAR: &str = "PGHOST";

/// Command that builds and installs the generator under test
pub const INSTALL_COMMAND: &[&str] = &["go", "install", "github.com/hydrogen18/sillyquill"];

/// Generator executable, relative to the toolchain root
pub const GENERATOR_BINARY: &str = "bin/sillyquill";

/// Flag the generator takes its configuration artifact path from
pub const GENERATOR_CONFIG_FLAG: &str = "-conf";

/// Suffix of the temporary generator configuration artifact
pub const ARTIFACT_SUFFIX: &str = "sillyquill.toml";

/// Database client used for administrative commands and schema loading
pub const DATABASE_CLIENT: &str = "psql";

/// Database the CREATE/DROP commands run against
pub const ADMIN_DATABASE: &str = "postgres";

/// Prefix of every scratch database name
pub const DATABASE_PREFIX: &str = "sillyquill";

/// Static schema script loaded into the scratch database
pub const SCHEMA_FILE: &str = "schema.sql";

/// Database schema the generator introspects
pub const SCHEMA_NAME: &str = "public";

/// Package name of the generated code
pub const PACKAGE_NAME: &str = "dal";

/// Output directory for generated code, relative to the toolchain root
pub const OUTPUT_DIR: &str = "src/github.com/hydrogen18/sillyquill/gen_test/dal";

/// Test command run against the generated code
pub const TEST_COMMAND: &[&str] = &["go", "test", "-v"];

/// Working directory of the test command
pub const TEST_DIR: &str = ".";

/// Variable carrying the scratch database connection string to the tests
pub const CONNECTION_ENV_VAR: &str = "DB";

/// Base name of the optional config file looked up by `HarnessConfig::load`
pub const CONFIG_FILE: &str = "gencheck";

/// Prefix of environment variables overriding config values
pub const ENV_PREFIX: &str = "GENCHECK";
