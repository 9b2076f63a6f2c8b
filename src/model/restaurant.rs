//! Restaurant documents

use serde::{Deserialize, Serialize};

use crate::store::ObjectId;

/// A document in `restaurants`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub type_of_food: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Not declared in the validator
    #[serde(rename = "URL", default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Restaurant {
    pub fn new(name: impl Into<String>, type_of_food: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            type_of_food: type_of_food.into(),
            rating: None,
            address: None,
            url: None,
        }
    }

    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The string inspections use in `restaurant_id`
    pub fn inspection_key(&self) -> Option<String> {
        self.id.map(|id| id.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_skips_absent_fields() {
        let r = Restaurant::new("Luigi's", "Pizza").with_rating(4.5);
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"name": "Luigi's", "type_of_food": "Pizza", "rating": 4.5})
        );
    }

    #[test]
    fn test_deserialize_store_document() {
        let doc = json!({
            "_id": {"$oid": "64b7f0c2a1b2c3d4e5f60718"},
            "name": "Wok Inn",
            "type_of_food": "Chinese",
            "URL": "http://example.com/wok",
            "rating": 5
        });
        let r: Restaurant = serde_json::from_value(doc).unwrap();
        assert_eq!(r.url.as_deref(), Some("http://example.com/wok"));
        assert_eq!(r.rating, Some(5.0));
        assert_eq!(r.inspection_key().as_deref(), Some("64b7f0c2a1b2c3d4e5f60718"));
    }
}
