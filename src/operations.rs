// Operation table: every request type the client can send, the arguments it
// prompts for, and how those arguments (plus session state) become the
// `requestData` object.
//
// Blank optional input means "leave the field out". Blank required input is a
// `MissingArgument` error and nothing is sent.

use crate::credentials::CredentialEncoder;
use crate::error::DispatchError;
use crate::image::{expand_home, ImagePayload};
use crate::session::{Session, SessionField};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Languages requested whenever an operation asks for translated names.
pub const LANGUAGES: &[&str] = &["en", "nl", "ar"];

/// Category new products land in unless the user names one.
pub const DEFAULT_CATEGORY: &str = "uncategorized";
pub const DEFAULT_MANUFACTURER: &str = "unknown";

/// The server refuses to create more items than this in one request.
pub const MAX_ITEM_COUNT: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Required,
    Optional,
    /// Read without echo; passed through untrimmed.
    Secret,
    /// Read without echo; blank means "leave unchanged".
    OptionalSecret,
}

/// One value the user is asked for before an operation is built.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub key: &'static str,
    pub prompt: &'static str,
    pub kind: ArgKind,
}

impl ArgSpec {
    pub fn is_secret(&self) -> bool {
        matches!(self.kind, ArgKind::Secret | ArgKind::OptionalSecret)
    }
}

const fn required(key: &'static str, prompt: &'static str) -> ArgSpec {
    ArgSpec { key, prompt, kind: ArgKind::Required }
}

const fn optional(key: &'static str, prompt: &'static str) -> ArgSpec {
    ArgSpec { key, prompt, kind: ArgKind::Optional }
}

const fn secret(key: &'static str, prompt: &'static str) -> ArgSpec {
    ArgSpec { key, prompt, kind: ArgKind::Secret }
}

/// Session mutation applied after a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Store the returned token and the username it belongs to.
    CaptureLogin,
    ClearToken,
    /// Remember `responseData.productItemID` as the last created object.
    CaptureObjectId,
}

/// User-supplied argument values, keyed by `ArgSpec::key`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(BTreeMap<String, String>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// Trimmed value, `None` when absent or blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    /// Untrimmed value, `None` when absent or empty.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|s| !s.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<&str, DispatchError> {
        self.get(key).ok_or(DispatchError::MissingArgument(key))
    }
}

/// Everything a payload builder may look at.
pub struct BuildContext<'a> {
    pub session: &'a Session,
    pub args: &'a Args,
    pub encoder: &'a dyn CredentialEncoder,
}

pub type PayloadBuilder = fn(&BuildContext<'_>) -> Result<Map<String, Value>, DispatchError>;

/// Static definition of one request type.
pub struct OperationDescriptor {
    pub name: &'static str,
    pub args: &'static [ArgSpec],
    /// Advisory only: requests are still sent when these are missing.
    pub requires: &'static [SessionField],
    pub effect: Effect,
    pub build: PayloadBuilder,
}

impl std::fmt::Debug for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationDescriptor")
            .field("name", &self.name)
            .field("effect", &self.effect)
            .finish()
    }
}

impl OperationDescriptor {
    pub fn build_payload(&self, ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
        (self.build)(ctx)
    }

    /// Session fields this operation expects but the session lacks.
    pub fn missing_fields(&self, session: &Session) -> Vec<SessionField> {
        self.requires
            .iter()
            .copied()
            .filter(|f| !session.has(*f))
            .collect()
    }
}

const AUTHENTICATED: &[SessionField] = &[SessionField::Username, SessionField::Token];

pub static OPERATIONS: &[OperationDescriptor] = &[
    OperationDescriptor {
        name: "login",
        args: &[required("username", "Username"), secret("password", "Password")],
        requires: &[],
        effect: Effect::CaptureLogin,
        build: build_credentials,
    },
    OperationDescriptor {
        name: "registerUser",
        args: &[required("username", "Username"), secret("password", "Password")],
        requires: &[],
        effect: Effect::None,
        build: build_credentials,
    },
    OperationDescriptor {
        name: "logout",
        args: &[],
        requires: AUTHENTICATED,
        effect: Effect::ClearToken,
        build: build_empty,
    },
    OperationDescriptor {
        name: "getProduct",
        args: &[required("productID", "Product ID")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_get_product,
    },
    OperationDescriptor {
        name: "getProductList",
        args: &[optional("criteria", "Criteria (JSON object, blank for all)")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_criteria,
    },
    OperationDescriptor {
        name: "deleteProduct",
        args: &[required("productID", "Product ID")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_product_id,
    },
    OperationDescriptor {
        name: "addProduct",
        args: &[
            required("productID", "Product ID"),
            optional("categoryID", "Category ID (blank for uncategorized)"),
            optional("manufacturer", "Manufacturer"),
            optional("name", "Name (blank to reuse the product ID)"),
            optional("description", "Description"),
            optional("image", "Image file"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_add_product,
    },
    OperationDescriptor {
        name: "updateProduct",
        args: &[
            required("productID", "Product ID"),
            optional("newProductID", "New product ID"),
            optional("categoryID", "Category ID"),
            optional("manufacturer", "Manufacturer"),
            optional("name", "Name"),
            optional("description", "Description"),
            optional("image", "Image file"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_update_product,
    },
    OperationDescriptor {
        name: "addProductCategory",
        args: &[
            required("categoryID", "Category ID"),
            optional("name", "Name (blank to reuse the category ID)"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_add_category,
    },
    OperationDescriptor {
        name: "deleteProductCategory",
        args: &[required("categoryID", "Category ID")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_category_id,
    },
    OperationDescriptor {
        name: "getProductCategory",
        args: &[required("categoryID", "Category ID")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_get_category,
    },
    OperationDescriptor {
        name: "getProductCategoryList",
        args: &[optional("criteria", "Criteria (JSON object, blank for all)")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_criteria,
    },
    OperationDescriptor {
        name: "updateProductCategory",
        args: &[
            required("categoryID", "Category ID"),
            optional("newCategoryID", "New category ID"),
            optional("name", "Name"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_update_category,
    },
    OperationDescriptor {
        name: "addProductItem",
        args: &[
            required("productID", "Product ID"),
            optional("count", "Count (1-30, blank for 1)"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::CaptureObjectId,
        build: build_add_item,
    },
    OperationDescriptor {
        name: "updateProductItem",
        args: &[
            optional("productItemID", "Product item ID (blank for last created)"),
            required("productID", "Product ID"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_update_item,
    },
    OperationDescriptor {
        name: "deleteProductItem",
        args: &[optional("productItemID", "Product item ID (blank for last created)")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_delete_item,
    },
    OperationDescriptor {
        name: "deleteUser",
        args: &[required("username", "Username")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_username,
    },
    OperationDescriptor {
        name: "updateUser",
        args: &[
            required("username", "Username"),
            ArgSpec {
                key: "password",
                prompt: "New password (blank to keep)",
                kind: ArgKind::OptionalSecret,
            },
            optional("permission", "Permission level"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_update_user,
    },
    OperationDescriptor {
        name: "addLoan",
        args: &[
            required("productID", "Product ID"),
            required("start", "Start"),
            required("end", "End"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_add_loan,
    },
    OperationDescriptor {
        name: "getProductAvailability",
        args: &[required("products", "Product IDs (comma separated)")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_availability,
    },
    OperationDescriptor {
        name: "getProductItems",
        args: &[optional("products", "Product IDs (comma separated, blank for all)")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_product_items,
    },
    OperationDescriptor {
        name: "getLoans",
        args: &[optional("userId", "User ID (blank for your own)")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_get_loans,
    },
    OperationDescriptor {
        name: "deleteLoan",
        args: &[required("loanId", "Loan ID")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_delete_loan,
    },
    OperationDescriptor {
        name: "getUsers",
        args: &[],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_empty,
    },
    OperationDescriptor {
        name: "extendLoan",
        args: &[
            required("loanID", "Loan ID"),
            required("start", "Start"),
            required("end", "End"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_extend_loan,
    },
    OperationDescriptor {
        name: "resizeLoan",
        args: &[
            required("loanId", "Loan ID"),
            required("start", "Start"),
            required("end", "End"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_resize_loan,
    },
    OperationDescriptor {
        name: "setLoanAcquired",
        args: &[
            required("loanId", "Loan ID"),
            required("value", "Acquired (yes/no)"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_set_loan_acquired,
    },
    OperationDescriptor {
        name: "getUnavailableDates",
        args: &[
            required("productId", "Product ID"),
            required("start", "Start"),
            required("end", "End"),
        ],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_unavailable_dates,
    },
    OperationDescriptor {
        name: "checkToken",
        args: &[],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_empty,
    },
    OperationDescriptor {
        name: "getImages",
        args: &[required("images", "Image IDs (comma separated)")],
        requires: AUTHENTICATED,
        effect: Effect::None,
        build: build_get_images,
    },
];

/// Find an operation by its `requestType` name.
pub fn lookup(name: &str) -> Option<&'static OperationDescriptor> {
    OPERATIONS.iter().find(|op| op.name == name)
}

fn build_empty(_: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    Ok(Map::new())
}

fn build_credentials(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let username = ctx.args.required("username")?;
    let password = ctx
        .args
        .raw("password")
        .ok_or(DispatchError::MissingArgument("password"))?;
    let mut data = Map::new();
    data.insert("username".into(), json!(username));
    data.insert("password".into(), json!(ctx.encoder.encode(username, password)));
    Ok(data)
}

fn build_product_id(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("productID".into(), json!(ctx.args.required("productID")?));
    Ok(data)
}

fn build_category_id(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("categoryID".into(), json!(ctx.args.required("categoryID")?));
    Ok(data)
}

fn build_username(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("username".into(), json!(ctx.args.required("username")?));
    Ok(data)
}

fn build_get_product(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = build_product_id(ctx)?;
    data.insert("language".into(), json!(LANGUAGES));
    data.insert("sendImage".into(), json!(false));
    Ok(data)
}

fn build_get_category(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = build_category_id(ctx)?;
    // The server reads the requested languages from `name` for categories.
    data.insert("name".into(), json!(LANGUAGES));
    Ok(data)
}

fn build_criteria(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let criteria = match ctx.args.get("criteria") {
        None => Value::Object(Map::new()),
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(v @ Value::Object(_)) => v,
            Ok(_) => return Err(invalid("criteria", "expected a JSON object")),
            Err(e) => return Err(invalid("criteria", e.to_string())),
        },
    };
    let mut data = Map::new();
    data.insert("criteria".into(), criteria);
    Ok(data)
}

fn build_add_product(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let product_id = ctx.args.required("productID")?;
    let mut data = Map::new();
    data.insert("productID".into(), json!(product_id));
    data.insert(
        "categoryID".into(),
        json!(ctx.args.get("categoryID").unwrap_or(DEFAULT_CATEGORY)),
    );
    data.insert(
        "manufacturer".into(),
        json!(ctx.args.get("manufacturer").unwrap_or(DEFAULT_MANUFACTURER)),
    );
    data.insert(
        "name".into(),
        json!({ "en": ctx.args.get("name").unwrap_or(product_id) }),
    );
    if let Some(description) = ctx.args.get("description") {
        data.insert("description".into(), json!({ "en": description }));
    }
    insert_image(&mut data, ctx.args)?;
    Ok(data)
}

fn build_update_product(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = build_product_id(ctx)?;
    copy_optional(&mut data, ctx.args, &["newProductID", "categoryID", "manufacturer"]);
    if let Some(name) = ctx.args.get("name") {
        data.insert("name".into(), json!({ "en": name }));
    }
    if let Some(description) = ctx.args.get("description") {
        data.insert("description".into(), json!({ "en": description }));
    }
    insert_image(&mut data, ctx.args)?;
    Ok(data)
}

fn build_add_category(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let category_id = ctx.args.required("categoryID")?;
    let mut data = Map::new();
    data.insert("categoryID".into(), json!(category_id));
    data.insert(
        "name".into(),
        json!({ "en": ctx.args.get("name").unwrap_or(category_id) }),
    );
    Ok(data)
}

fn build_update_category(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = build_category_id(ctx)?;
    copy_optional(&mut data, ctx.args, &["newCategoryID"]);
    if let Some(name) = ctx.args.get("name") {
        data.insert("name".into(), json!({ "en": name }));
    }
    Ok(data)
}

fn build_add_item(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = build_product_id(ctx)?;
    if let Some(count) = ctx.args.get("count") {
        let count: u32 = count
            .parse()
            .map_err(|_| invalid("count", format!("'{count}' is not a whole number")))?;
        if !(1..=MAX_ITEM_COUNT).contains(&count) {
            return Err(invalid("count", format!("must be between 1 and {MAX_ITEM_COUNT}")));
        }
        data.insert("count".into(), json!(count));
    }
    Ok(data)
}

/// Explicit id, or the item created last in this session.
fn item_id<'a>(ctx: &'a BuildContext<'_>) -> Result<&'a str, DispatchError> {
    match ctx.args.get("productItemID") {
        Some(id) => Ok(id),
        None if !ctx.session.last_object_id.is_empty() => Ok(&ctx.session.last_object_id),
        None => Err(DispatchError::MissingArgument("productItemID")),
    }
}

fn build_update_item(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("productItemID".into(), json!(item_id(ctx)?));
    data.insert("productID".into(), json!(ctx.args.required("productID")?));
    Ok(data)
}

fn build_delete_item(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("productItemID".into(), json!(item_id(ctx)?));
    Ok(data)
}

fn build_update_user(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let username = ctx.args.required("username")?;
    let mut data = Map::new();
    data.insert("username".into(), json!(username));
    if let Some(password) = ctx.args.raw("password") {
        // Digest is salted with the account being changed, not the caller.
        data.insert("password".into(), json!(ctx.encoder.encode(username, password)));
    }
    if let Some(permission) = ctx.args.get("permission") {
        let level: i64 = permission
            .parse()
            .map_err(|_| invalid("permission", format!("'{permission}' is not an integer")))?;
        data.insert("permission".into(), json!(level));
    }
    Ok(data)
}

fn build_add_loan(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = build_product_id(ctx)?;
    insert_range(&mut data, ctx.args)?;
    Ok(data)
}

fn build_availability(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let products = split_list(ctx.args.required("products")?);
    if products.is_empty() {
        return Err(DispatchError::MissingArgument("products"));
    }
    let mut data = Map::new();
    data.insert("products".into(), json!(products));
    Ok(data)
}

fn build_product_items(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    if let Some(list) = ctx.args.get("products") {
        let products = split_list(list);
        if !products.is_empty() {
            data.insert("products".into(), json!(products));
        }
    }
    Ok(data)
}

fn build_get_loans(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    copy_optional(&mut data, ctx.args, &["userId"]);
    Ok(data)
}

fn build_delete_loan(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("loanId".into(), json!(ctx.args.required("loanId")?));
    Ok(data)
}

fn build_extend_loan(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("loanID".into(), json!(ctx.args.required("loanID")?));
    insert_range(&mut data, ctx.args)?;
    Ok(data)
}

fn build_resize_loan(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("loanId".into(), json!(loan_number(ctx.args)?));
    insert_range(&mut data, ctx.args)?;
    Ok(data)
}

fn build_set_loan_acquired(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let value = ctx.args.required("value")?;
    let acquired = match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => true,
        "n" | "no" | "false" | "0" => false,
        _ => return Err(invalid("value", format!("'{value}' is not yes or no"))),
    };
    let mut data = Map::new();
    data.insert("loanId".into(), json!(loan_number(ctx.args)?));
    data.insert("value".into(), json!(acquired));
    Ok(data)
}

fn build_unavailable_dates(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let mut data = Map::new();
    data.insert("productId".into(), json!(ctx.args.required("productId")?));
    insert_range(&mut data, ctx.args)?;
    Ok(data)
}

fn build_get_images(ctx: &BuildContext<'_>) -> Result<Map<String, Value>, DispatchError> {
    let images = split_list(ctx.args.required("images")?);
    if images.is_empty() {
        return Err(DispatchError::MissingArgument("images"));
    }
    let mut data = Map::new();
    data.insert("images".into(), json!(images));
    Ok(data)
}

/// Loan ids that the server expects as JSON integers.
fn loan_number(args: &Args) -> Result<i64, DispatchError> {
    let id = args.required("loanId")?;
    id.parse()
        .map_err(|_| invalid("loanId", format!("'{id}' is not an integer")))
}

fn insert_range(data: &mut Map<String, Value>, args: &Args) -> Result<(), DispatchError> {
    data.insert("start".into(), json!(args.required("start")?));
    data.insert("end".into(), json!(args.required("end")?));
    Ok(())
}

fn copy_optional(data: &mut Map<String, Value>, args: &Args, keys: &[&str]) {
    for key in keys {
        if let Some(value) = args.get(key) {
            data.insert((*key).to_string(), json!(value));
        }
    }
}

fn insert_image(data: &mut Map<String, Value>, args: &Args) -> Result<(), DispatchError> {
    if let Some(path) = args.get("image") {
        let image = ImagePayload::from_file(&expand_home(path))?;
        data.insert(
            "image".into(),
            json!({ "data": image.data, "extension": image.extension }),
        );
    }
    Ok(())
}

fn split_list(input: &str) -> Vec<&str> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn invalid(name: &'static str, reason: impl Into<String>) -> DispatchError {
    DispatchError::InvalidArgument {
        name,
        reason: reason.into(),
    }
}
