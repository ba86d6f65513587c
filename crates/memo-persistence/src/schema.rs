//! Esquema Diesel (declarado manualmente). Reemplazable con `diesel print-schema`.

diesel::table! {
    computation_records (fingerprint) {
        fingerprint -> Text,
        record_id -> Uuid,
        name -> Text,
        descriptor -> Jsonb,
        artifact_location -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}
