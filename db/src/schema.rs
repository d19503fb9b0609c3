// Mirrors db/schema.sql.

diesel::table! {
    users (id) {
        id -> Text,
        #[max_length = 64]
        nickname -> Varchar,
        #[max_length = 120]
        email -> Varchar,
        #[max_length = 140]
        about_me -> Nullable<Varchar>,
        last_seen -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    posts (id) {
        id -> Text,
        seq -> Int8,
        author_id -> Text,
        #[max_length = 140]
        body -> Varchar,
        timestamp -> Timestamptz,
    }
}

diesel::table! {
    followers (follower_id, followed_id) {
        follower_id -> Text,
        followed_id -> Text,
    }
}

diesel::joinable!(posts -> users (author_id));

diesel::allow_tables_to_appear_in_same_query!(followers, posts, users);
