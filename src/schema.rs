// Shared tables live in the public schema. The tables below the marker are
// per-tenant: they exist once inside every tenant schema and are resolved
// through the connection search_path (see crate::tenancy::context).

diesel::table! {
    users (id) {
        id -> Uuid,
        #[max_length = 254]
        email -> Varchar,
        #[max_length = 150]
        username -> Varchar,
        #[max_length = 255]
        password_hash -> Varchar,
        #[max_length = 150]
        first_name -> Nullable<Varchar>,
        #[max_length = 150]
        last_name -> Nullable<Varchar>,
        is_staff -> Bool,
        is_superuser -> Bool,
        #[max_length = 25]
        approval_status -> Varchar,
        organisation_codes -> Nullable<Array<Text>>,
        author_id -> Nullable<Uuid>,
        is_deleted -> Bool,
        date_joined -> Timestamptz,
        is_active -> Bool,
        activated_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    organisations (id) {
        id -> Uuid,
        #[max_length = 63]
        schema_name -> Varchar,
        #[max_length = 100]
        name -> Varchar,
        #[max_length = 254]
        email -> Nullable<Varchar>,
        description -> Nullable<Text>,
        #[max_length = 8]
        organisation_code -> Nullable<Varchar>,
        #[max_length = 150]
        quater -> Nullable<Varchar>,
        #[max_length = 150]
        address_line1 -> Nullable<Varchar>,
        #[max_length = 150]
        address_line2 -> Nullable<Varchar>,
        #[max_length = 150]
        phone -> Nullable<Varchar>,
        #[max_length = 25]
        approval_status -> Varchar,
        owner_id -> Nullable<Uuid>,
        author_id -> Nullable<Uuid>,
        metadata -> Jsonb,
        is_deleted -> Bool,
        is_active -> Bool,
        activated_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    user_tenants (user_id, tenant_id) {
        user_id -> Uuid,
        tenant_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    domains (id) {
        id -> Uuid,
        #[max_length = 253]
        domain -> Varchar,
        tenant_id -> Nullable<Uuid>,
        is_primary -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

// --- per-tenant tables (schema-local) ---

diesel::table! {
    groups (id) {
        id -> Uuid,
        #[max_length = 150]
        name -> Varchar,
    }
}

diesel::table! {
    user_tenant_permissions (id) {
        id -> Uuid,
        user_id -> Uuid,
        is_staff -> Bool,
        is_superuser -> Bool,
    }
}

diesel::table! {
    permission_groups (permission_id, group_id) {
        permission_id -> Uuid,
        group_id -> Uuid,
    }
}

diesel::table! {
    profiles (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 1000]
        bio -> Nullable<Varchar>,
        #[max_length = 50]
        phone -> Nullable<Varchar>,
        #[max_length = 50]
        address1 -> Nullable<Varchar>,
        #[max_length = 50]
        address2 -> Nullable<Varchar>,
        #[max_length = 50]
        city -> Nullable<Varchar>,
        #[max_length = 50]
        quater -> Nullable<Varchar>,
        #[max_length = 50]
        profile_type -> Varchar,
        #[max_length = 20]
        gender -> Nullable<Varchar>,
        photo_key -> Nullable<Text>,
        document_key -> Nullable<Text>,
        certifications -> Nullable<Text>,
        metadata -> Jsonb,
        is_deleted -> Bool,
        is_active -> Bool,
        activated_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    otps (id) {
        id -> Uuid,
        user_id -> Uuid,
        #[max_length = 6]
        otp_code -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(domains -> organisations (tenant_id));
diesel::joinable!(user_tenants -> users (user_id));
diesel::joinable!(user_tenants -> organisations (tenant_id));
diesel::joinable!(user_tenant_permissions -> users (user_id));
diesel::joinable!(permission_groups -> user_tenant_permissions (permission_id));
diesel::joinable!(permission_groups -> groups (group_id));
diesel::joinable!(profiles -> users (user_id));
diesel::joinable!(otps -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    domains,
    groups,
    organisations,
    otps,
    permission_groups,
    profiles,
    user_tenant_permissions,
    user_tenants,
    users,
);
