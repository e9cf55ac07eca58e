// src/constants.rs

/// Marker printed in front of every pre/post target message.
pub const MSG_PREFIX: &str = "==>";

/// Prefix used by the error helpers of the output facade.
pub const ERROR_PREFIX: &str = "Error:";

/// Header line of the target listing.
pub const HELP_HEADER: &str = "Available targets:";

/// Indentation of a target name in the listing.
pub const HELP_NAME_INDENT: &str = "   ";

/// Indentation of a target description in the listing.
pub const HELP_DESC_INDENT: &str = "      ";

/// Target name reserved for showing the listing.
pub const HELP_TARGET: &str = "help";

/// Process exit code for a duplicate target registration.
pub const EXIT_CONFIG_ERROR: i32 = 2;
