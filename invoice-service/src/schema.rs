diesel::table! {
    customers (id) {
        id -> Int4,
        fullname -> Varchar,
        email -> Varchar,
        phone -> Varchar,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        price -> Numeric,
        stock -> Int4,
    }
}

diesel::table! {
    invoices (id) {
        id -> Int4,
        customer_id -> Int4,
        total -> Numeric,
        status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    invoice_products (invoice_id, position) {
        invoice_id -> Int4,
        position -> Int4,
        product_id -> Int4,
    }
}

diesel::joinable!(invoices -> customers (customer_id));
diesel::joinable!(invoice_products -> invoices (invoice_id));
diesel::joinable!(invoice_products -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    customers,
    products,
    invoices,
    invoice_products,
);
