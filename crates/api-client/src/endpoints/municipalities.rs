//! Municipality and postal-code endpoints

use crate::client::FindixiClient;
use crate::error::ApiResult;
use findixi_geo::Coordinate;
use serde::{Deserialize, Serialize};

/// Municipality lookup API
#[derive(Clone)]
pub struct MunicipalitiesApi {
    client: FindixiClient,
}

impl MunicipalitiesApi {
    /// Create a new municipalities API interface
    pub(crate) fn new(client: FindixiClient) -> Self {
        Self { client }
    }

    /// List every municipality ordered by name (fills the filter dropdown)
    pub async fn list(&self) -> ApiResult<Vec<MunicipalityRow>> {
        self.client
            .get("municipalities?select=id,name,latitude,longitude&order=name")
            .await
    }

    /// Centroid coordinates of a municipality by name
    pub async fn centroid(&self, name: &str) -> ApiResult<Option<Coordinate>> {
        let path = format!(
            "municipalities?select=latitude,longitude&name=eq.{}&limit=1",
            encode_component(name)
        );

        #[derive(Deserialize)]
        struct CentroidRow {
            latitude: Option<f64>,
            longitude: Option<f64>,
        }

        let rows: Vec<CentroidRow> = self.client.get(&path).await?;
        Ok(rows.into_iter().next().and_then(|row| {
            match (row.latitude, row.longitude) {
                (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
                _ => None,
            }
        }))
    }

    /// Municipality name for a postal code, when the table knows it
    pub async fn by_postal_code(&self, code: &str) -> ApiResult<Option<String>> {
        let path = format!(
            "postal_codes?select=municipality&code=eq.{}&limit=1",
            encode_component(code)
        );

        #[derive(Deserialize)]
        struct PostalRow {
            municipality: Option<String>,
        }

        let rows: Vec<PostalRow> = self.client.get(&path).await?;
        Ok(rows.into_iter().next().and_then(|row| row.municipality))
    }
}

/// One municipality row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MunicipalityRow {
    /// Municipality id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Centroid latitude
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Centroid longitude
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl MunicipalityRow {
    /// Centroid coordinate, when both columns are present
    #[must_use]
    pub fn centroid(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

/// Percent-encode a municipality name or postal code for a filter value
fn encode_component(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '&' | '#' | '?' | '%' | '=' => format!("%{:02X}", c as u32),
            other => other.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid_requires_both_columns() {
        let row = MunicipalityRow {
            id: 1,
            name: "Cabo Rojo".to_string(),
            latitude: Some(18.0866),
            longitude: None,
        };
        assert!(row.centroid().is_none());

        let row = MunicipalityRow {
            latitude: Some(18.0866),
            longitude: Some(-67.1457),
            ..row
        };
        assert!(row.centroid().is_some());
    }

    #[test]
    fn test_encode_component_spaces() {
        assert_eq!(encode_component("San Germán"), "San%20Germán");
    }
}
