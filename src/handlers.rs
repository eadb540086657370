use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{
        Account, CreateAccountRequest, CreatePostForm, LoginRequest, LoginResponse, NewPost, Post,
        PostUpdate, UpdatePostForm,
    },
    password,
};
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode},
};
use uuid::Uuid;

/// Folder prefix for every post image in the asset store.
const POSTS_FOLDER: &str = "blog-posts";

/// Header carrying the one-time provisioning secret for account creation.
pub const SETUP_TOKEN_HEADER: &str = "x-setup-token";

// --- Multipart Plumbing ---

/// The decoded fields of a post submission. Both create and update read the
/// same multipart shape; requiredness is enforced per handler afterwards.
#[derive(Default)]
struct PostForm {
    title: Option<String>,
    content: Option<String>,
    image: Option<ImagePart>,
}

/// One uploaded image: raw bytes plus the content type the client declared.
struct ImagePart {
    bytes: Vec<u8>,
    content_type: String,
}

fn bad_multipart(err: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("invalid multipart body: {err}"))
}

/// Drains a `multipart/form-data` body into a `PostForm`.
///
/// Unknown field names are skipped rather than rejected, so clients can send
/// extra metadata without breaking. An `image` part with zero bytes counts as
/// absent (browsers submit empty file inputs that way).
async fn read_post_form(mut multipart: Multipart) -> Result<PostForm, ApiError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        // The name must be copied out before the field is consumed below.
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match name.as_str() {
            "title" => form.title = Some(field.text().await.map_err(bad_multipart)?),
            "content" => form.content = Some(field.text().await.map_err(bad_multipart)?),
            "image" => {
                let content_type = field
                    .content_type()
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| "application/octet-stream".to_owned());
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                if !bytes.is_empty() {
                    form.image = Some(ImagePart {
                        bytes: bytes.to_vec(),
                        content_type,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

// --- Handlers ---

/// login
///
/// [Public Route] Exchanges a username and password for a signed bearer
/// token valid for 24 hours.
///
/// *Security*: Unknown usernames and wrong passwords produce the identical
/// 401 body, so the response never confirms which accounts exist.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Unknown username or wrong password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let account = state
        .repo
        .find_account_by_username(&payload.username)
        .await?
        .ok_or(ApiError::InvalidCredential)?;

    if !password::verify_password(&payload.password, &account.password_hash) {
        return Err(ApiError::InvalidCredential);
    }

    let token = state.tokens.issue(account.id, &account.username)?;
    Ok(Json(LoginResponse { token }))
}

/// create_account
///
/// [Admin Route] Provisions an author account with a freshly hashed
/// password. Intended for bootstrap and the occasional extra admin, not
/// public signup.
///
/// *Security*: Gated by the `x-setup-token` header, which must match the
/// `SETUP_TOKEN` the server was started with. When no `SETUP_TOKEN` is
/// configured the endpoint answers exactly like a wrong token, so probes
/// cannot tell a disabled gate from a failed guess.
#[utoipa::path(
    post,
    path = "/admin/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Blank username or short password"),
        (status = 401, description = "Missing or wrong setup token"),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let presented = headers
        .get(SETUP_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::MissingCredential)?;

    if state.config.setup_token.as_deref() != Some(presented) {
        return Err(ApiError::InvalidCredential);
    }

    let username = payload.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username is required".to_owned()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".to_owned(),
        ));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let account = state.repo.insert_account(username, &password_hash).await?;

    tracing::info!("provisioned account {}", account.username);
    Ok((StatusCode::CREATED, Json(account)))
}

/// list_posts
///
/// [Public Route] Lists every post, newest first. There is no draft state,
/// so anything an author has created is visible here.
#[utoipa::path(
    get,
    path = "/posts",
    responses((status = 200, description = "All posts, newest first", body = [Post]))
)]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state.repo.list_posts().await?;
    Ok(Json(posts))
}

/// get_post
///
/// [Public Route] Retrieves a single post by ID.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    match state.repo.get_post(id).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound),
    }
}

/// create_post
///
/// [Authenticated Route] Accepts a multipart submission with `title`,
/// `content` and an optional `image` file. The author is taken from the
/// bearer token, never from the form.
///
/// *Flow*: When an image is attached it is uploaded to the asset store
/// first; only a successful upload reaches the insert. A rejected upload
/// therefore leaves no half-written post behind.
#[utoipa::path(
    post,
    path = "/posts",
    request_body(content = CreatePostForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Missing title or content"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 502, description = "Image upload failed")
    )
)]
pub async fn create_post(
    AuthUser { account_id, .. }: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let form = read_post_form(multipart).await?;

    let title = form
        .title
        .filter(|title| !title.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("title is required".to_owned()))?;
    let content = form
        .content
        .ok_or_else(|| ApiError::BadRequest("content is required".to_owned()))?;

    let image_url = match form.image {
        Some(image) => Some(
            state
                .assets
                .upload(image.bytes, &image.content_type, POSTS_FOLDER)
                .await?,
        ),
        None => None,
    };

    let post = state
        .repo
        .create_post(NewPost {
            author_id: account_id,
            title,
            content,
            image_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Partially updates a post. Omitted form fields keep
/// their stored values; a field sent as an empty string overwrites (except
/// `title`, which may never become blank). A new `image` replaces the old
/// URL, the previous object stays in the store unreferenced.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body(content = UpdatePostForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 400, description = "Blank title"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Not Found"),
        (status = 502, description = "Image upload failed")
    )
)]
pub async fn update_post(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Post>, ApiError> {
    let form = read_post_form(multipart).await?;

    if form.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("title cannot be empty".to_owned()));
    }

    // Same upload-first contract as create. If the row turns out to be gone
    // the fresh object stays behind unreferenced.
    let image_url = match form.image {
        Some(image) => Some(
            state
                .assets
                .upload(image.bytes, &image.content_type, POSTS_FOLDER)
                .await?,
        ),
        None => None,
    };

    let patch = PostUpdate {
        title: form.title,
        content: form.content,
        image_url,
    };

    match state.repo.update_post(id, patch).await? {
        Some(post) => Ok(Json(post)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_post
///
/// [Authenticated Route] Removes a post permanently. The stored image, if
/// any, is not touched.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_post(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
