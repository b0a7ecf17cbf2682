// Kept in sync with DbContext::init_schema.

diesel::table! {
    events (id) {
        id -> Text,
        collection -> Text,
        title -> Text,
        date -> Text,
        location -> Text,
        url -> Text,
        scraped_at -> Text,
    }
}

diesel::table! {
    page_cache (key) {
        key -> Text,
        body -> Text,
        fetched_at -> BigInt,
        expires_at -> BigInt,
    }
}

diesel::allow_tables_to_appear_in_same_query!(events, page_cache);
