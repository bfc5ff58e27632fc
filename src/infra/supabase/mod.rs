// Hosted backend adapter: PostgREST tables, GoTrue auth and object storage
// behind one reqwest client.

pub mod supabase_auth;
pub mod supabase_client;
pub mod supabase_rest;
pub mod supabase_storage;

pub use supabase_client::SupabaseClient;
