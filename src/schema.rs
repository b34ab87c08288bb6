diesel::table! {
    config_templates (id) {
        id -> Int4,
        name -> Varchar,
        description -> Varchar,
        cookbook_repo_url -> Varchar,
        nodes_spec -> Text,
        server_group_spec -> Text,
        job_type -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    config_templates_smoke_tests (config_template_id, smoke_test_id) {
        config_template_id -> Int4,
        smoke_test_id -> Int4,
    }
}

diesel::table! {
    job_groups (id) {
        id -> Int4,
        status -> Varchar,
        smoke_test_id -> Int4,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    jobs (id) {
        id -> Int4,
        status -> Varchar,
        stdout -> Nullable<Text>,
        stderr -> Nullable<Text>,
        nova_revision -> Nullable<Varchar>,
        glance_revision -> Nullable<Varchar>,
        msg -> Nullable<Varchar>,
        job_group_id -> Int4,
        config_template_id -> Int4,
        #[sql_name = "type"]
        kind -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    package_builders (id) {
        id -> Int4,
        #[sql_name = "type"]
        kind -> Varchar,
        url -> Varchar,
        branch -> Nullable<Varchar>,
        merge_trunk -> Bool,
        smoke_test_id -> Int4,
        packager_url -> Varchar,
        revision_hash -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    smoke_tests (id) {
        id -> Int4,
        description -> Nullable<Varchar>,
        status -> Varchar,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        hashed_password -> Varchar,
        salt -> Varchar,
        is_active -> Bool,
        is_admin -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(config_templates_smoke_tests -> config_templates (config_template_id));
diesel::joinable!(config_templates_smoke_tests -> smoke_tests (smoke_test_id));
diesel::joinable!(job_groups -> smoke_tests (smoke_test_id));
diesel::joinable!(jobs -> config_templates (config_template_id));
diesel::joinable!(jobs -> job_groups (job_group_id));
diesel::joinable!(package_builders -> smoke_tests (smoke_test_id));

diesel::allow_tables_to_appear_in_same_query!(
    config_templates,
    config_templates_smoke_tests,
    job_groups,
    jobs,
    package_builders,
    smoke_tests,
    users,
);
