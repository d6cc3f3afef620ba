diesel::table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        display_name -> Text,
        password_hash -> Text,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    clients (id) {
        id -> Uuid,
        name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        address -> Nullable<Text>,
        city -> Nullable<Text>,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    catalog_items (id) {
        id -> Uuid,
        name -> Text,
        category -> Text,
        unit -> Text,
        default_rate -> Numeric,
        default_description -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    quotations (id) {
        id -> Uuid,
        client_id -> Nullable<Uuid>,
        client_name -> Nullable<Text>,
        title -> Text,
        status -> Text,
        total_amount -> Numeric,
        labor_cost -> Numeric,
        design_fee_type -> Text,
        design_fee_value -> Numeric,
        tax_percentage -> Numeric,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    rooms (id) {
        id -> Uuid,
        quotation_id -> Uuid,
        name -> Text,
        length -> Nullable<Numeric>,
        width -> Nullable<Numeric>,
        height -> Nullable<Numeric>,
        notes -> Nullable<Text>,
        room_total -> Numeric,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    room_line_items (id) {
        id -> Uuid,
        room_id -> Uuid,
        catalog_item_id -> Nullable<Uuid>,
        description -> Text,
        specification -> Nullable<Text>,
        unit -> Text,
        rate -> Numeric,
        quantity -> Numeric,
        total -> Numeric,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    projects (id) {
        id -> Uuid,
        quotation_id -> Uuid,
        name -> Text,
        status -> Text,
        budget -> Numeric,
        start_date -> Nullable<Date>,
        end_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    project_tasks (id) {
        id -> Uuid,
        project_id -> Uuid,
        title -> Text,
        status -> Text,
        due_date -> Nullable<Date>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    project_notes (id) {
        id -> Uuid,
        project_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    expenses (id) {
        id -> Uuid,
        project_id -> Uuid,
        description -> Text,
        amount -> Numeric,
        category -> Text,
        expense_date -> Date,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(rooms -> quotations (quotation_id));
diesel::joinable!(room_line_items -> rooms (room_id));
diesel::joinable!(room_line_items -> catalog_items (catalog_item_id));
diesel::joinable!(quotations -> clients (client_id));
diesel::joinable!(projects -> quotations (quotation_id));
diesel::joinable!(project_tasks -> projects (project_id));
diesel::joinable!(project_notes -> projects (project_id));
diesel::joinable!(expenses -> projects (project_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    clients,
    catalog_items,
    quotations,
    rooms,
    room_line_items,
    projects,
    project_tasks,
    project_notes,
    expenses,
);
