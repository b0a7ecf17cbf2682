//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Event record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EventRecord {
    pub id: String,
    pub collection: String,
    pub title: String,
    pub date: String,
    pub location: String,
    pub url: String,
    pub scraped_at: String,
}

/// New event for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::events)]
pub struct NewEvent<'a> {
    pub id: &'a str,
    pub collection: &'a str,
    pub title: &'a str,
    pub date: &'a str,
    pub location: &'a str,
    pub url: &'a str,
    pub scraped_at: String,
}

/// Cached page record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::page_cache)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PageCacheRecord {
    pub key: String,
    pub body: String,
    pub fetched_at: i64,
    pub expires_at: i64,
}
