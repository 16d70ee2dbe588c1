//! Catalog entities

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::identity::ProductId;

/// Entity types known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Product,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Product => "product",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product, stored as one document in the authoritative store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Price in minor currency units.
    pub price: i32,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        description: impl Into<String>,
        price: i32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
        }
    }

    /// Check business rules. Runs before any store or cache mutation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string(),
            });
        }

        if self.description.is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "description".to_string(),
            });
        }

        if self.price <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "price".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::new_product_id;

    fn make_test_product() -> Product {
        Product::new(new_product_id(), "Lamp", "Desk lamp", 1999)
    }

    #[test]
    fn test_valid_product_passes() {
        assert!(make_test_product().validate().is_ok());
    }

    #[test]
    fn test_name_required() {
        let product = Product {
            name: String::new(),
            ..make_test_product()
        };
        assert_eq!(
            product.validate(),
            Err(ValidationError::RequiredFieldMissing {
                field: "name".to_string()
            })
        );
    }

    #[test]
    fn test_description_required() {
        let product = Product {
            description: String::new(),
            ..make_test_product()
        };
        let err = product.validate().unwrap_err();
        assert_eq!(err.to_string(), "description is required");
    }

    #[test]
    fn test_price_must_be_positive() {
        for price in [0, -1, i32::MIN] {
            let product = Product {
                price,
                ..make_test_product()
            };
            let err = product.validate().unwrap_err();
            assert_eq!(err.to_string(), "price must be greater than 0");
        }
    }

    #[test]
    fn test_name_checked_before_price() {
        let product = Product {
            name: String::new(),
            price: -5,
            ..make_test_product()
        };
        assert_eq!(product.validate().unwrap_err().to_string(), "name is required");
    }

    #[test]
    fn test_product_serializes_id_as_string() -> Result<(), serde_json::Error> {
        let product = make_test_product();
        let json = serde_json::to_value(&product)?;
        assert_eq!(json["id"], serde_json::Value::String(product.id.to_string()));
        let back: Product = serde_json::from_value(json)?;
        assert_eq!(back, product);
        Ok(())
    }
}
