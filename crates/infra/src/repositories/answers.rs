use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use formsrv_domain::answers::{Answer, AnswerResponse};
use formsrv_domain::criteria::{Criteria, Page};
use formsrv_domain::error::DomainError;
use formsrv_domain::ports::answers::AnswerRepository;
use formsrv_domain::ports::BoxFuture;
use formsrv_domain::DomainResult;

use crate::db::{criteria_to_filter, MongoAdapter};
use crate::repositories::{fields_to_update_document, map_mongo_error};

pub const ANSWERS_COLLECTION: &str = "answers";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnswerResponseDocument {
    pub question_id: String,
    pub answer: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnswerDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub form_id: String,
    #[serde(default)]
    pub user_id: String,
    pub responses: Vec<AnswerResponseDocument>,
}

impl From<&AnswerResponse> for AnswerResponseDocument {
    fn from(response: &AnswerResponse) -> Self {
        Self {
            question_id: response.question_id.clone(),
            answer: response.answer.clone(),
            values: response.values.clone(),
        }
    }
}

impl From<AnswerResponseDocument> for AnswerResponse {
    fn from(document: AnswerResponseDocument) -> Self {
        Self {
            question_id: document.question_id,
            answer: document.answer,
            values: document.values,
        }
    }
}

impl From<&Answer> for AnswerDocument {
    fn from(answer: &Answer) -> Self {
        Self {
            id: ObjectId::parse_str(&answer.id).ok(),
            form_id: answer.form_id.clone(),
            user_id: answer.user_id.clone(),
            responses: answer
                .responses
                .iter()
                .map(AnswerResponseDocument::from)
                .collect(),
        }
    }
}

impl From<AnswerDocument> for Answer {
    fn from(document: AnswerDocument) -> Self {
        Self {
            id: document.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            form_id: document.form_id,
            user_id: document.user_id,
            responses: document
                .responses
                .into_iter()
                .map(AnswerResponse::from)
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct MongoAnswerRepository {
    collection: Collection<AnswerDocument>,
}

impl MongoAnswerRepository {
    pub fn new(adapter: &MongoAdapter) -> Self {
        Self {
            collection: adapter.collection(ANSWERS_COLLECTION),
        }
    }
}

impl AnswerRepository for MongoAnswerRepository {
    fn save(&self, answer: &Answer) -> BoxFuture<'_, DomainResult<String>> {
        let document = AnswerDocument::from(answer);
        let collection = self.collection.clone();
        Box::pin(async move {
            let inserted = collection
                .insert_one(document, None)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.answers.save"))?;
            match inserted.inserted_id {
                Bson::ObjectId(oid) => Ok(oid.to_hex()),
                other => Err(DomainError::persistence(
                    "mongo.answers.save",
                    format!("unexpected inserted id: {other}"),
                )),
            }
        })
    }

    fn find(&self, id: &str) -> BoxFuture<'_, DomainResult<Option<Answer>>> {
        let id = id.to_string();
        let collection = self.collection.clone();
        Box::pin(async move {
            let Ok(oid) = ObjectId::parse_str(&id) else {
                return Ok(None);
            };
            let document = collection
                .find_one(doc! { "_id": oid }, None)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.answers.find"))?;
            Ok(document.map(Answer::from))
        })
    }

    fn matching(
        &self,
        criteria: &Criteria,
        page: Page,
    ) -> BoxFuture<'_, DomainResult<Vec<Answer>>> {
        let filter = criteria_to_filter(criteria);
        let collection = self.collection.clone();
        Box::pin(async move {
            let options = FindOptions::builder()
                .skip((page.offset > 0).then_some(page.offset))
                .limit((page.limit > 0).then_some(page.limit as i64))
                .build();
            let mut cursor = collection
                .find(filter, options)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.answers.matching"))?;
            let mut answers = Vec::new();
            while let Some(document) = cursor
                .try_next()
                .await
                .map_err(|err| map_mongo_error(err, "mongo.answers.matching.decode"))?
            {
                answers.push(Answer::from(document));
            }
            Ok(answers)
        })
    }

    fn update_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> BoxFuture<'_, DomainResult<Answer>> {
        let id = id.to_string();
        let fields = fields.clone();
        let collection = self.collection.clone();
        Box::pin(async move {
            let Ok(oid) = ObjectId::parse_str(&id) else {
                return Err(DomainError::not_found("mongo.answers.update_fields"));
            };
            if fields.is_empty() {
                return Err(DomainError::validation(
                    "mongo.answers.update_fields",
                    "no fields to update",
                ));
            }
            let updates = fields_to_update_document(&fields, "mongo.answers.update_fields")?;
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            let document = collection
                .find_one_and_update(doc! { "_id": oid }, doc! { "$set": updates }, options)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.answers.update_fields"))?;
            document
                .map(Answer::from)
                .ok_or(DomainError::not_found("mongo.answers.update_fields"))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let id = id.to_string();
        let collection = self.collection.clone();
        Box::pin(async move {
            let Ok(oid) = ObjectId::parse_str(&id) else {
                return Err(DomainError::not_found("mongo.answers.delete"));
            };
            let result = collection
                .delete_one(doc! { "_id": oid }, None)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.answers.delete"))?;
            if result.deleted_count == 0 {
                return Err(DomainError::not_found("mongo.answers.delete"));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_round_trips_through_its_document() {
        let answer = Answer {
            id: "65f2a7b8c9d0e1f2a3b4c5d6".to_string(),
            form_id: "507f1f77bcf86cd799439011".to_string(),
            user_id: "user-9".to_string(),
            responses: vec![AnswerResponse {
                question_id: "q-1".to_string(),
                answer: "yes".to_string(),
                values: vec!["yes".to_string()],
            }],
        };
        let document = AnswerDocument::from(&answer);
        let back = Answer::from(document);
        assert_eq!(back, answer);
    }
}
