use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, from_document, Bson, Document};
use mongodb::error::Result as MongoResult;
use mongodb::options::FindOptions;
use mongodb::{options::ClientOptions, Client, Collection};
use std::time::Duration;

use crate::{
    config::MongoConfig,
    constants::*,
    models::{DeliveryOutcome, NotificationRecord, NotificationStatus, UserRecord},
    store::{ChangeFeed, NotificationStore, RecordChange, StoreError, UserStore},
    utils::{get_epoch_ts, parse_object_id},
};

pub struct AppDatabase {
    client: Client,
    db_name: String,
}

impl AppDatabase {
    pub async fn new(config: &MongoConfig) -> MongoResult<Self> {
        let timeout = Duration::from_secs(MONGO_CONN_TIMEOUT);
        // create the mongodb client options
        let mut client_options = ClientOptions::parse(&config.uri).await?;
        client_options.max_pool_size = Some(config.max_pool_size);
        client_options.min_pool_size = Some(config.min_pool_size);
        client_options.connect_timeout = Some(timeout);
        // create the client and return Result object
        let client = Client::with_options(client_options)?;
        let app_db = Self {
            client,
            db_name: config.database.to_owned(),
        };
        Ok(app_db)
    }

    fn collection<T>(&self, coll: &str) -> Collection<T> {
        self.client.database(&self.db_name).collection::<T>(coll)
    }

    async fn find_documents(
        &self,
        coll: &str,
        filter: Option<Document>,
        options: Option<FindOptions>,
    ) -> MongoResult<Vec<Document>> {
        let coll = self.collection::<Document>(coll);
        let mut cursor = coll.find(filter, options).await?;
        let mut data = vec![];
        while let Some(doc) = cursor.next().await {
            data.push(doc?);
        }
        Ok(data)
    }
}

/// Decode a notification document.
/// Ids that cannot be addressed again count as malformed.
fn decode_notification(document: Document) -> Result<NotificationRecord, String> {
    let record = from_document::<NotificationRecord>(document).map_err(|err| err.to_string())?;
    if record.id.is_none() {
        return Err("unsupported record id".to_owned());
    }
    Ok(record)
}

/// Filter matching a record id as handed out by `deserialize_id`.
/// The stored `_id` may be an ObjectId, a string or an integer.
fn record_id_filter(id: &str) -> Document {
    let mut candidates = vec![Bson::String(id.to_owned())];
    if let Some(oid) = parse_object_id(id) {
        candidates.push(Bson::ObjectId(oid));
    }
    if let Ok(n) = id.parse::<i64>() {
        if let Ok(n) = i32::try_from(n) {
            candidates.push(Bson::Int32(n));
        }
        candidates.push(Bson::Int64(n));
    }
    doc! {"$in": candidates}
}

/// Conditional update: only a pending record may transition
async fn apply_outcome(
    coll: &Collection<Document>,
    id_filter: Bson,
    outcome: &DeliveryOutcome,
) -> Result<bool, StoreError> {
    let filter = doc! {"_id": id_filter, "status": NotificationStatus::Pending.as_str()};
    let update = outcome
        .to_update_doc()
        .map_err(|err| StoreError::Serialization(err.to_string()))?;
    let result = coll.update_one(filter, update, None).await?;
    Ok(result.modified_count == 1)
}

/// Decode a pending document. One that cannot be decoded is marked failed,
/// otherwise every rescan would pick it up again.
async fn decode_or_fail(
    coll: &Collection<Document>,
    document: Document,
) -> Option<NotificationRecord> {
    let raw_id = document.get("_id").cloned();
    let err = match decode_notification(document) {
        Ok(record) => return Some(record),
        Err(err) => err,
    };
    let Some(raw_id) = raw_id else {
        tracing::warn!("skipping notification document without _id: {err}");
        return None;
    };
    tracing::warn!("malformed notification {raw_id}: {err}");
    let outcome = DeliveryOutcome::failed(format!("malformed notification: {err}"), get_epoch_ts());
    match apply_outcome(coll, raw_id.clone(), &outcome).await {
        Ok(_) => tracing::debug!("notification {raw_id} marked failed"),
        Err(err) => tracing::error!("unable to mark notification {raw_id} failed: {err}"),
    }
    None
}

#[async_trait]
impl NotificationStore for AppDatabase {
    async fn insert(&self, record: &NotificationRecord) -> Result<String, StoreError> {
        let coll = self.collection::<NotificationRecord>(COLL_NOTIFICATIONS);
        let result = coll.insert_one(record, None).await?;
        let id = match result.inserted_id.as_object_id() {
            Some(oid) => oid.to_hex(),
            None => return Err(StoreError::InvalidId(result.inserted_id.to_string())),
        };
        Ok(id)
    }

    async fn subscribe_pending(&self) -> Result<ChangeFeed, StoreError> {
        let coll = self.collection::<Document>(COLL_NOTIFICATIONS);
        let pipeline = vec![doc! {
            "$match": {
                "operationType": "insert",
                "fullDocument.status": NotificationStatus::Pending.as_str(),
            }
        }];
        let stream = coll.watch(pipeline, None).await?;
        let feed = stream.filter_map(move |event| {
            let coll = coll.clone();
            async move {
                match event {
                    Ok(event) => {
                        let document = event.full_document?;
                        decode_or_fail(&coll, document)
                            .await
                            .and_then(RecordChange::from_record)
                            .map(Ok)
                    }
                    Err(err) => Some(Err(StoreError::from(err))),
                }
            }
        });
        Ok(feed.boxed())
    }

    async fn find_pending(&self, limit: i64) -> Result<Vec<NotificationRecord>, StoreError> {
        let filter = doc! {"status": NotificationStatus::Pending.as_str()};
        let options = FindOptions::builder()
            .sort(Some(doc! {"createdAt": 1}))
            .limit(Some(limit))
            .build();
        let documents = self
            .find_documents(COLL_NOTIFICATIONS, Some(filter), Some(options))
            .await?;
        let coll = self.collection::<Document>(COLL_NOTIFICATIONS);
        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            if let Some(record) = decode_or_fail(&coll, document).await {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn record_outcome(
        &self,
        id: &str,
        outcome: &DeliveryOutcome,
    ) -> Result<bool, StoreError> {
        let coll = self.collection::<Document>(COLL_NOTIFICATIONS);
        let id_filter = Bson::Document(record_id_filter(id));
        apply_outcome(&coll, id_filter, outcome).await
    }
}

#[async_trait]
impl UserStore for AppDatabase {
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let documents = self.find_documents(COLL_USERS, None, None).await?;
        let users = documents
            .into_iter()
            .filter_map(|document| match from_document::<UserRecord>(document) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!("skipping malformed user document: {:?}", err);
                    None
                }
            })
            .collect();
        Ok(users)
    }
}
