//! Input validation for caller-supplied configuration
//!
//! Every value that ends up verbatim in an artifact (device ids, bridge
//! names, port and queue numbers) is checked here before any parsing or
//! emission starts.

use crate::core::address::MacAddress;

/// Upper bound on hardware queues accepted for striping.
pub const MAX_QUEUES: u16 = 1024;

/// Upper bound on synthetic rules per request.
pub const MAX_RANDOM_RULES: usize = 1 << 22;

/// Validates the number of hardware queues to stripe rules over.
///
/// Returns `Ok(Some(warning))` for counts most NICs do not expose.
///
/// # Examples
///
/// ```
/// use flowgen::validators::validate_queue_count;
///
/// assert!(validate_queue_count(0).is_err());
/// assert_eq!(validate_queue_count(4), Ok(None));
/// assert!(validate_queue_count(256).unwrap().is_some());
/// ```
pub fn validate_queue_count(count: u16) -> Result<Option<String>, String> {
    if count == 0 {
        return Err("The number of hardware queues must be at least 1".to_string());
    }
    if count > MAX_QUEUES {
        return Err(format!("At most {MAX_QUEUES} hardware queues are supported"));
    }
    if count > 128 {
        return Ok(Some(format!(
            "{count} queues is more than most NICs expose (usually <= 128)"
        )));
    }
    Ok(None)
}

/// Validates an OpenFlow datapath id of the form `of:` + 16 hex digits.
/// Either case is accepted; the controller emitter writes it lowercase.
pub fn validate_device_id(id: &str) -> Result<(), String> {
    let Some(hex) = id.strip_prefix("of:") else {
        return Err(format!("Device id '{id}' must start with 'of:'"));
    };
    if hex.len() != 16 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!(
            "Device id '{id}' must carry exactly 16 hexadecimal digits"
        ));
    }
    Ok(())
}

/// Validates a switch bridge name.
///
/// Bridges are network interfaces, so the kernel naming rules apply:
/// - Max 15 characters (IFNAMSIZ - 1)
/// - Alphanumeric, dot, dash, underscore only
/// - Cannot be "." or ".."
pub fn validate_bridge_name(name: &str) -> Result<String, String> {
    if name.is_empty() {
        return Err("Bridge name cannot be empty".to_string());
    }

    if name.len() > 15 {
        return Err("Bridge name too long (max 15 characters)".to_string());
    }

    if name == "." || name == ".." {
        return Err("Invalid bridge name".to_string());
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err("Bridge name contains invalid characters".to_string());
    }

    Ok(name.to_string())
}

/// Validates a switch port number used for matching or output.
///
/// # Errors
///
/// Returns `Err` if the port is 0 (not a valid OpenFlow port).
pub fn validate_switch_port(port: u32) -> Result<u32, String> {
    if port == 0 {
        Err("Switch ports start at 1".to_string())
    } else {
        Ok(port)
    }
}

pub fn validate_mac(text: &str) -> Result<MacAddress, String> {
    text.parse()
        .map_err(|_| format!("'{text}' is not a MAC address (expected xx:xx:xx:xx:xx:xx)"))
}

/// Validates a synthetic rule count.
///
/// Returns `Ok(Some(warning))` when the count exceeds what hardware flow
/// tables usually hold.
pub fn validate_rule_count(count: usize) -> Result<Option<String>, String> {
    if count == 0 {
        return Err("At least one rule must be generated".to_string());
    }
    if count > MAX_RANDOM_RULES {
        return Err(format!("At most {MAX_RANDOM_RULES} rules can be generated"));
    }
    if count > 65_536 {
        return Ok(Some(format!(
            "{count} rules exceeds typical hardware flow table capacity (65536)"
        )));
    }
    Ok(None)
}
