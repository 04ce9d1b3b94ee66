// handlers/elevated/root - /api/root/* handlers, global admins only
pub mod tenant;
