// Two tiers, mirroring the middleware that guards them:
// protected (single-tenant context) and elevated (global-admin context).
pub mod elevated;
pub mod protected;
