use std::collections::HashMap;

use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use formsrv_domain::criteria::{Criteria, Page};
use formsrv_domain::error::DomainError;
use formsrv_domain::forms::{Form, Question, QuestionKind};
use formsrv_domain::ports::forms::FormRepository;
use formsrv_domain::ports::BoxFuture;
use formsrv_domain::DomainResult;

use crate::db::{criteria_to_filter, MongoAdapter};
use crate::repositories::{fields_to_update_document, map_mongo_error};

pub const FORMS_COLLECTION: &str = "forms";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionDocument {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub required: bool,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// Storage shape of a form: `_id` is the driver's ObjectId, absent until the
/// store assigns one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FormDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionDocument>,
}

impl From<&Question> for QuestionDocument {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            title: question.title.clone(),
            description: question.description.clone(),
            kind: question.kind,
            required: question.required,
            section: question.section.clone(),
            metadata: question.metadata.clone(),
        }
    }
}

impl From<QuestionDocument> for Question {
    fn from(document: QuestionDocument) -> Self {
        Self {
            id: document.id,
            title: document.title,
            description: document.description,
            kind: document.kind,
            required: document.required,
            section: document.section,
            metadata: document.metadata,
        }
    }
}

impl From<&Form> for FormDocument {
    fn from(form: &Form) -> Self {
        Self {
            id: ObjectId::parse_str(&form.id).ok(),
            title: form.title.clone(),
            description: form.description.clone(),
            questions: form.questions.iter().map(QuestionDocument::from).collect(),
        }
    }
}

impl From<FormDocument> for Form {
    fn from(document: FormDocument) -> Self {
        Self {
            id: document.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            title: document.title,
            description: document.description,
            questions: document.questions.into_iter().map(Question::from).collect(),
        }
    }
}

#[derive(Clone)]
pub struct MongoFormRepository {
    collection: Collection<FormDocument>,
}

impl MongoFormRepository {
    pub fn new(adapter: &MongoAdapter) -> Self {
        Self {
            collection: adapter.collection(FORMS_COLLECTION),
        }
    }
}

impl FormRepository for MongoFormRepository {
    fn save(&self, form: &Form) -> BoxFuture<'_, DomainResult<String>> {
        let document = FormDocument::from(form);
        let collection = self.collection.clone();
        Box::pin(async move {
            let inserted = collection
                .insert_one(document, None)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.forms.save"))?;
            match inserted.inserted_id {
                Bson::ObjectId(oid) => Ok(oid.to_hex()),
                other => Err(DomainError::persistence(
                    "mongo.forms.save",
                    format!("unexpected inserted id: {other}"),
                )),
            }
        })
    }

    fn find(&self, id: &str) -> BoxFuture<'_, DomainResult<Option<Form>>> {
        let id = id.to_string();
        let collection = self.collection.clone();
        Box::pin(async move {
            // An id that is not valid ObjectId hex cannot name a stored form.
            let Ok(oid) = ObjectId::parse_str(&id) else {
                return Ok(None);
            };
            let document = collection
                .find_one(doc! { "_id": oid }, None)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.forms.find"))?;
            Ok(document.map(Form::from))
        })
    }

    fn find_all(&self) -> BoxFuture<'_, DomainResult<Vec<Form>>> {
        let collection = self.collection.clone();
        Box::pin(async move {
            let mut cursor = collection
                .find(None, None)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.forms.find_all"))?;
            let mut forms = Vec::new();
            while let Some(document) = cursor
                .try_next()
                .await
                .map_err(|err| map_mongo_error(err, "mongo.forms.find_all.decode"))?
            {
                forms.push(Form::from(document));
            }
            Ok(forms)
        })
    }

    fn matching(&self, criteria: &Criteria, page: Page) -> BoxFuture<'_, DomainResult<Vec<Form>>> {
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
                .map_err(|err| map_mongo_error(err, "mongo.forms.matching"))?;
            let mut forms = Vec::new();
            while let Some(document) = cursor
                .try_next()
                .await
                .map_err(|err| map_mongo_error(err, "mongo.forms.matching.decode"))?
            {
                forms.push(Form::from(document));
            }
            Ok(forms)
        })
    }

    fn update_fields(
        &self,
        id: &str,
        fields: &Map<String, Value>,
    ) -> BoxFuture<'_, DomainResult<Form>> {
        let id = id.to_string();
        let fields = fields.clone();
        let collection = self.collection.clone();
        Box::pin(async move {
            let Ok(oid) = ObjectId::parse_str(&id) else {
                return Err(DomainError::not_found("mongo.forms.update_fields"));
            };
            if fields.is_empty() {
                return Err(DomainError::validation(
                    "mongo.forms.update_fields",
                    "no fields to update",
                ));
            }
            let updates = fields_to_update_document(&fields, "mongo.forms.update_fields")?;
            let options = FindOneAndUpdateOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            let document = collection
                .find_one_and_update(doc! { "_id": oid }, doc! { "$set": updates }, options)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.forms.update_fields"))?;
            document
                .map(Form::from)
                .ok_or(DomainError::not_found("mongo.forms.update_fields"))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, DomainResult<()>> {
        let id = id.to_string();
        let collection = self.collection.clone();
        Box::pin(async move {
            let Ok(oid) = ObjectId::parse_str(&id) else {
                return Err(DomainError::not_found("mongo.forms.delete"));
            };
            let result = collection
                .delete_one(doc! { "_id": oid }, None)
                .await
                .map_err(|err| map_mongo_error(err, "mongo.forms.delete"))?;
            if result.deleted_count == 0 {
                return Err(DomainError::not_found("mongo.forms.delete"));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_form(id: &str) -> Form {
        Form {
            id: id.to_string(),
            title: "Feedback".to_string(),
            description: "Quarterly feedback".to_string(),
            questions: vec![Question {
                id: "q-1".to_string(),
                title: "Rating".to_string(),
                description: "Overall rating".to_string(),
                kind: QuestionKind::Radio,
                required: true,
                section: "general".to_string(),
                metadata: HashMap::from([("options".to_string(), json!(["1", "2", "3"]))]),
            }],
        }
    }

    #[test]
    fn form_round_trips_through_its_document() {
        let form = sample_form("507f1f77bcf86cd799439011");
        let document = FormDocument::from(&form);
        assert_eq!(
            document.id,
            Some(ObjectId::parse_str("507f1f77bcf86cd799439011").expect("oid"))
        );
        let back = Form::from(document);
        assert_eq!(back, form);
    }

    #[test]
    fn unsaved_form_maps_to_document_without_id() {
        let form = sample_form("");
        let document = FormDocument::from(&form);
        assert_eq!(document.id, None);
        let back = Form::from(document);
        assert_eq!(back.id, "");
    }
}
