//! Name normalization shared by import matching and analytics grouping

/// Placeholder used when a CSV row has no driver name
pub const UNKNOWN_DRIVER: &str = "Unknown Driver";

/// Placeholder used when a CSV row has no vehicle name
pub const UNKNOWN_VEHICLE: &str = "Unknown Vehicle";

/// Collapse internal whitespace and trim, keeping the original casing
pub fn tidy(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive lookup key for driver names, vehicle names and providers
pub fn name_key(name: &str) -> String {
    tidy(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_ignores_case_and_spacing() {
        assert_eq!(name_key("  Ahmed   Khan "), "ahmed khan");
        assert_eq!(name_key("AHMED KHAN"), name_key("ahmed khan"));
    }

    #[test]
    fn test_tidy_keeps_case() {
        assert_eq!(tidy(" Toyota\tCamry "), "Toyota Camry");
    }
}
