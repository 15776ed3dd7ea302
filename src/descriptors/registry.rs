// Model lookup over the static catalogue.

use super::models::MODELS;
use super::ModelDescriptor;
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref BY_NAME: HashMap<String, &'static ModelDescriptor> = {
        let mut map = HashMap::new();
        for model in MODELS {
            let prev = map.insert(format!("{}::{}", model.vendor, model.model), model);
            debug_assert!(prev.is_none(), "duplicate model entry");
        }
        map
    };
}

/// Look up a model by vendor and model name.
pub fn find_model(vendor: &str, model: &str) -> Option<&'static ModelDescriptor> {
    BY_NAME.get(&format!("{vendor}::{model}")).copied()
}

/// All supported models, catalogue order.
pub fn all_models() -> &'static [ModelDescriptor] {
    MODELS
}

/// Models grouped by vendor, sorted within each group.
pub fn models_by_vendor() -> HashMap<&'static str, Vec<&'static ModelDescriptor>> {
    let mut by_vendor: HashMap<&'static str, Vec<&'static ModelDescriptor>> = HashMap::new();
    for model in MODELS {
        by_vendor.entry(model.vendor).or_default().push(model);
    }
    for group in by_vendor.values_mut() {
        group.sort_by(|a, b| a.model.cmp(b.model));
    }
    by_vendor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_models() {
        let uv5r = find_model("Baofeng", "UV-5R").unwrap();
        assert_eq!(uv5r.display, "Baofeng UV-5R");
        assert!(find_model("Baofeng", "UV-99X").is_none());
        assert!(find_model("Nokia", "3310").is_none());
    }

    #[test]
    fn vendor_grouping() {
        let grouped = models_by_vendor();
        assert!(grouped["Baofeng"].len() >= 3);
        assert!(grouped.contains_key("Wouxun"));
        let baofeng = &grouped["Baofeng"];
        assert!(baofeng.windows(2).all(|w| w[0].model <= w[1].model));
    }

    #[test]
    fn catalogue_has_no_duplicates() {
        assert_eq!(BY_NAME.len(), MODELS.len());
    }
}
