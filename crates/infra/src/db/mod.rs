pub mod postgres;

use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};

use formsrv_domain::criteria::{Criteria, FilterOperator, FilterValue};

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub dsn: String,
    pub database: String,
}

impl MongoConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            dsn: config.mongo_dsn.clone(),
            database: config.mongo_db.clone(),
        }
    }
}

/// Shared MongoDB handle; repositories take typed collections from it.
#[derive(Clone)]
pub struct MongoAdapter {
    database: Database,
}

impl MongoAdapter {
    pub async fn connect(config: &MongoConfig) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(&config.dsn).await?;
        options.app_name = Some("formsrv".to_string());
        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        tracing::info!(database = %config.database, "mongo adapter connected");
        Ok(Self { database })
    }

    pub fn collection<T>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }
}

fn bson_value(value: &FilterValue) -> Bson {
    match value {
        FilterValue::Text(text) => Bson::String(text.clone()),
        FilterValue::Int(int) => Bson::Int64(*int),
        FilterValue::List(list) => {
            Bson::Array(list.iter().cloned().map(Bson::String).collect())
        }
    }
}

/// Translates a criteria into a MongoDB filter document. Filters combine by
/// key on one document, i.e. logical AND in declaration order.
pub fn criteria_to_filter(criteria: &Criteria) -> Document {
    let mut filter = Document::new();
    for entry in criteria.filters() {
        let value = bson_value(&entry.value);
        let condition = match entry.operator {
            FilterOperator::Equal => value,
            FilterOperator::NotEqual => Bson::Document(doc! { "$ne": value }),
            FilterOperator::GreaterThan => Bson::Document(doc! { "$gt": value }),
            FilterOperator::GreaterEqual => Bson::Document(doc! { "$gte": value }),
            FilterOperator::LessThan => Bson::Document(doc! { "$lt": value }),
            FilterOperator::LessEqual => Bson::Document(doc! { "$lte": value }),
            FilterOperator::Like => match &entry.value {
                FilterValue::Text(pattern) => {
                    Bson::Document(doc! { "$regex": pattern.clone(), "$options": "i" })
                }
                _ => value,
            },
            FilterOperator::NotLike => match &entry.value {
                FilterValue::Text(pattern) => Bson::Document(
                    doc! { "$not": { "$regex": pattern.clone(), "$options": "i" } },
                ),
                _ => Bson::Document(doc! { "$ne": value }),
            },
            FilterOperator::In => Bson::Document(doc! { "$in": value }),
            FilterOperator::NotIn => Bson::Document(doc! { "$nin": value }),
        };
        filter.insert(entry.field.clone(), condition);
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsrv_domain::criteria::Filter;

    #[test]
    fn equal_translates_to_literal_match() {
        let criteria = Criteria::field_equals("form_id", "abc123");
        let filter = criteria_to_filter(&criteria);
        assert_eq!(filter, doc! { "form_id": "abc123" });
    }

    #[test]
    fn in_and_not_in_keep_the_list_unchanged() {
        let list = vec!["a".to_string(), "b".to_string()];
        let criteria = Criteria::new(vec![
            Filter::new("status", FilterOperator::In, list.clone()),
            Filter::new("owner", FilterOperator::NotIn, list),
        ]);
        let filter = criteria_to_filter(&criteria);
        assert_eq!(
            filter,
            doc! {
                "status": { "$in": ["a", "b"] },
                "owner": { "$nin": ["a", "b"] },
            }
        );
    }

    #[test]
    fn comparison_operators_map_to_dollar_forms() {
        let criteria = Criteria::new(vec![
            Filter::new("count", FilterOperator::NotEqual, 4i64),
            Filter::new("low", FilterOperator::GreaterThan, 1i64),
            Filter::new("high", FilterOperator::LessEqual, 9i64),
        ]);
        let filter = criteria_to_filter(&criteria);
        assert_eq!(
            filter,
            doc! {
                "count": { "$ne": 4i64 },
                "low": { "$gt": 1i64 },
                "high": { "$lte": 9i64 },
            }
        );
    }

    #[test]
    fn like_becomes_case_insensitive_regex() {
        let criteria = Criteria::new(vec![
            Filter::new("title", FilterOperator::Like, "survey"),
            Filter::new("section", FilterOperator::NotLike, "draft"),
        ]);
        let filter = criteria_to_filter(&criteria);
        assert_eq!(
            filter,
            doc! {
                "title": { "$regex": "survey", "$options": "i" },
                "section": { "$not": { "$regex": "draft", "$options": "i" } },
            }
        );
    }
}
