/// Default key expression prefix for the RTD-W bridge.
pub const DEFAULT_KEY_PREFIX: &str = "zensight/rtdw";

/// Builder for the bridge's key expressions.
///
/// Key expressions follow the pattern:
/// `<prefix>/<device>/point/<point>` for values and
/// `<prefix>/<device>/@/...` for control and error channels.
#[derive(Debug, Clone)]
pub struct KeyExprBuilder {
    prefix: String,
    device: String,
}

impl KeyExprBuilder {
    /// Create a builder using the default prefix.
    pub fn new(device: impl Into<String>) -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX, device)
    }

    /// Create a builder with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            device: device.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Key a point's updates are published on.
    ///
    /// # Example
    /// ```
    /// use rtdw_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("altherma");
    /// assert_eq!(
    ///     builder.point_key("outdoor_temp"),
    ///     "zensight/rtdw/altherma/point/outdoor_temp"
    /// );
    /// ```
    pub fn point_key(&self, point: &str) -> String {
        format!("{}/{}/point/{}", self.prefix, self.device, point)
    }

    /// Key a point's read/write failures are published on.
    pub fn failure_key(&self, point: &str) -> String {
        format!("{}/{}/@/errors/{}", self.prefix, self.device, point)
    }

    /// Key the bridge listens on for hub commands.
    pub fn command_key(&self) -> String {
        format!("{}/{}/@/commands", self.prefix, self.device)
    }

    /// Key the point table is announced on at startup.
    pub fn points_key(&self) -> String {
        format!("{}/{}/@/points", self.prefix, self.device)
    }

    /// Wildcard matching every point value of the device.
    pub fn point_wildcard(&self) -> String {
        format!("{}/{}/point/*", self.prefix, self.device)
    }

    /// Key for bridge status.
    ///
    /// # Example
    /// ```
    /// use rtdw_common::keyexpr::KeyExprBuilder;
    ///
    /// let builder = KeyExprBuilder::new("altherma");
    /// assert_eq!(builder.status_key(), "zensight/rtdw/@/status");
    /// ```
    pub fn status_key(&self) -> String {
        format!("{}/@/status", self.prefix)
    }
}

/// Parse a point key expression to extract device and point slug.
///
/// Returns `None` if the key is not a point value key under `prefix`.
pub fn parse_point_key<'a>(prefix: &str, key: &'a str) -> Option<ParsedPointKey<'a>> {
    let rest = key.strip_prefix(prefix)?.strip_prefix('/')?;
    let parts: Vec<&str> = rest.split('/').collect();

    match parts.as_slice() {
        [device, "point", point] if !device.is_empty() && !point.is_empty() => {
            Some(ParsedPointKey { device, point })
        }
        _ => None,
    }
}

/// Parsed components of a point key expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPointKey<'a> {
    pub device: &'a str,
    pub point: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builder() {
        let builder = KeyExprBuilder::new("altherma");

        assert_eq!(
            builder.point_key("compressor"),
            "zensight/rtdw/altherma/point/compressor"
        );
        assert_eq!(
            builder.failure_key("compressor"),
            "zensight/rtdw/altherma/@/errors/compressor"
        );
        assert_eq!(builder.command_key(), "zensight/rtdw/altherma/@/commands");
        assert_eq!(builder.points_key(), "zensight/rtdw/altherma/@/points");
        assert_eq!(builder.point_wildcard(), "zensight/rtdw/altherma/point/*");
    }

    #[test]
    fn test_custom_prefix() {
        let builder = KeyExprBuilder::with_prefix("home/heating", "hydrobox");
        assert_eq!(
            builder.point_key("defrost"),
            "home/heating/hydrobox/point/defrost"
        );
        assert_eq!(builder.status_key(), "home/heating/@/status");
    }

    #[test]
    fn test_parse_point_key() {
        let parsed =
            parse_point_key("zensight/rtdw", "zensight/rtdw/altherma/point/room_temp").unwrap();

        assert_eq!(parsed.device, "altherma");
        assert_eq!(parsed.point, "room_temp");
    }

    #[test]
    fn test_parse_invalid_key() {
        assert!(parse_point_key("zensight/rtdw", "invalid/key").is_none());
        assert!(parse_point_key("zensight/rtdw", "zensight/rtdw/altherma/@/commands").is_none());
        assert!(parse_point_key("zensight/rtdw", "zensight/rtdwx/altherma/point/a").is_none());
        assert!(parse_point_key("zensight/rtdw", "zensight/rtdw/altherma/point/").is_none());
    }
}
