//! Diesel schema definitions for the engine's tables.

diesel::table! {
    groups (group_id) {
        group_id -> BigInt,
        token_address -> Nullable<Text>,
        pools_json -> Text,
        emoji -> Text,
        contest_active -> Integer,
    }
}

diesel::table! {
    purchases (group_id, content_hash) {
        group_id -> BigInt,
        content_hash -> Text,
        wallet -> Text,
        token_address -> Text,
        token_name -> Text,
        token_symbol -> Text,
        token_decimals -> BigInt,
        native_amount -> BigInt,
        token_amount -> BigInt,
        is_buy -> Integer,
        is_sell -> Integer,
        seq -> BigInt,
    }
}

diesel::table! {
    sales (group_id, content_hash) {
        group_id -> BigInt,
        content_hash -> Text,
        wallet -> Text,
        token_address -> Text,
        token_name -> Text,
        token_symbol -> Text,
        token_decimals -> BigInt,
        native_amount -> BigInt,
        token_amount -> BigInt,
        is_buy -> Integer,
        is_sell -> Integer,
        seq -> BigInt,
    }
}

diesel::table! {
    deadlines (group_id) {
        group_id -> BigInt,
        deadline -> Nullable<BigInt>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(groups, purchases, sales, deadlines);
