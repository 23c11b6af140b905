mod aspect;
mod auth;
mod config;
mod discover;
mod error;
mod error_code;
mod ffmpeg;
mod file;
mod formats;
mod future;
mod ingest;
mod init_tracing;
mod media;
mod process;
mod repo;
mod state;
mod store;
#[cfg(test)]
mod test_tools;
#[cfg(test)]
mod tests;
mod tmp_file;

use std::sync::Arc;

use actix_form_data::{Field, Form, FormData, Multipart, Value};
use actix_web::{
    http::header::{CacheControl, CacheDirective},
    web, App, FromRequest, HttpRequest, HttpResponse, HttpServer,
};
use futures_util::TryStreamExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::Instrument;
use tracing_actix_web::TracingLogger;

use self::{
    auth::{Identity, TokenAuthority},
    config::Operation,
    error::{Error, UploadError},
    ingest::Ingested,
    init_tracing::init_tracing,
    media::{ArcMediaTools, Toolchain},
    repo::{NewVideo, VideoId},
    state::State,
    store::{Store, StoreError},
    tmp_file::TmpDir,
};

pub use self::config::ReelhouseConfiguration;

const MEGABYTES: usize = 1024 * 1024;
const MINUTES: u32 = 60;
const HOURS: u32 = 60 * MINUTES;
const DAYS: u32 = 24 * HOURS;

struct VideoUpload(Value<Ingested>);

impl FormData for VideoUpload {
    type Item = Ingested;
    type Error = Error;

    fn form(req: &HttpRequest) -> Form<Self::Item, Self::Error> {
        // This form is expecting a single file field, 'video'
        let state = req
            .app_data::<web::Data<State>>()
            .expect("No state in request")
            .clone();

        Form::new()
            .max_files(1)
            .max_file_size(state.config.server.max_upload_size * MEGABYTES)
            .transform_error(transform_error)
            .field(
                "video",
                Field::file(move |filename, content_type, stream| {
                    let state = state.clone();

                    metrics::counter!("reelhouse.files", "upload" => "inline").increment(1);

                    let span = tracing::info_span!("file-upload", ?filename);

                    let stream = stream.map_err(Error::from);

                    Box::pin(
                        async move {
                            let content_type = content_type.ok_or_else(|| {
                                Error::from(UploadError::UnsupportedContentType("none".to_owned()))
                            })?;

                            ingest::ingest(
                                &state.tmp_dir,
                                &*state.tools,
                                &state.store,
                                stream,
                                &content_type,
                            )
                            .await
                        }
                        .instrument(span),
                    )
                }),
            )
    }

    fn extract(value: Value<Self::Item>) -> Result<Self, Self::Error> {
        Ok(VideoUpload(value))
    }
}

fn parse_video_id(video_id: &str) -> Result<VideoId, Error> {
    video_id
        .parse()
        .map_err(|e| UploadError::InvalidVideoId(e).into())
}

#[tracing::instrument(name = "Creating video", skip(new_video, state))]
async fn create_video(
    identity: Identity,
    new_video: web::Json<NewVideo>,
    state: web::Data<State>,
) -> Result<HttpResponse, Error> {
    let video = state
        .repo
        .create_video(identity.user_id, new_video.into_inner())
        .await?;

    tracing::debug!("Created video {}", video.id);

    Ok(HttpResponse::Created().json(&video))
}

#[tracing::instrument(name = "Fetching video", skip(state))]
async fn get_video(
    video_id: web::Path<String>,
    state: web::Data<State>,
) -> Result<HttpResponse, Error> {
    let video_id = parse_video_id(&video_id)?;

    let video = state
        .repo
        .video(video_id)
        .await?
        .ok_or(UploadError::MissingVideo)?;

    Ok(HttpResponse::Ok().json(&video))
}

/// Attach an uploaded video to an existing record
///
/// The id, the caller and the record are all checked before the multipart body is read, so a
/// rejected request never reaches ffprobe or the store.
#[tracing::instrument(name = "Uploading video", skip(req, payload, state))]
async fn upload_video(
    req: HttpRequest,
    payload: web::Payload,
    video_id: web::Path<String>,
    state: web::Data<State>,
) -> Result<HttpResponse, actix_web::Error> {
    let video_id = parse_video_id(&video_id)?;

    let identity = Identity::extract(&req).await?;

    let video = state
        .repo
        .video(video_id)
        .await
        .map_err(Error::from)?
        .ok_or(UploadError::MissingVideo)
        .map_err(Error::from)?;

    if !video.is_owned_by(identity.user_id) {
        return Err(Error::from(UploadError::NotOwner).into());
    }

    let Multipart(VideoUpload(value)) =
        Multipart::<VideoUpload>::from_request(&req, &mut payload.into_inner())
            .await
            .map_err(actix_web::Error::from)?;

    let upload = value
        .map()
        .and_then(|mut m| m.remove("video"))
        .and_then(|video| video.file())
        .ok_or(UploadError::NoFiles)
        .map_err(Error::from)?;

    tracing::debug!("Uploaded {} as {}", upload.filename, upload.result.key);

    let video = video.with_url(upload.result.url);

    state.repo.update_video(&video).await.map_err(Error::from)?;

    Ok(HttpResponse::Ok().json(&video))
}

#[tracing::instrument(name = "Serving asset", skip(state))]
async fn serve_asset(
    key: web::Path<String>,
    state: web::Data<State>,
) -> Result<HttpResponse, Error> {
    let object = match state.store.open(&key).await {
        Ok(object) => object,
        Err(StoreError::ObjectNotFound(_) | StoreError::InvalidKey(_)) => {
            return Err(UploadError::MissingAsset.into())
        }
        Err(e) => return Err(e.into()),
    };

    let content_type = object
        .content_type
        .unwrap_or_else(|| guess_content_type(&key).to_string());

    Ok(HttpResponse::Ok()
        .insert_header(CacheControl(vec![
            CacheDirective::Public,
            CacheDirective::MaxAge(7 * DAYS),
            CacheDirective::Extension("immutable".to_owned(), None),
        ]))
        .content_type(content_type)
        .no_chunking(object.size as u64)
        .streaming(object.stream))
}

// The filesystem backend doesn't keep content types
fn guess_content_type(key: &str) -> mime::Mime {
    formats::VideoFormat::from_extension(key)
        .map(formats::VideoFormat::media_type)
        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

#[tracing::instrument(level = "debug", skip(state))]
async fn healthz(state: web::Data<State>) -> Result<HttpResponse, Error> {
    state.repo.health_check().await?;
    state.store.health_check().await?;
    Ok(HttpResponse::Ok().finish())
}

fn transform_error(error: actix_form_data::Error) -> actix_web::Error {
    let error: Error = error.into();
    let error: actix_web::Error = error.into();
    error
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|error, _| {
        let error: Error = UploadError::InvalidRequestBody(error).into();
        error.into()
    })
}

fn configure_endpoints(config: &mut web::ServiceConfig, state: State, tokens: TokenAuthority) {
    config
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(tokens))
        .app_data(json_config())
        .route("/healthz", web::get().to(healthz))
        .service(
            web::scope("/api")
                .service(web::resource("/videos").route(web::post().to(create_video)))
                .service(web::resource("/videos/{video_id}").route(web::get().to(get_video)))
                .service(
                    web::resource("/video_upload/{video_id}")
                        .route(web::post().to(upload_video)),
                ),
        )
        .service(web::resource("/assets/{key:.*}").route(web::get().to(serve_asset)));
}

async fn launch(state: State, tokens: TokenAuthority) -> std::io::Result<()> {
    let address = state.config.server.address;

    tracing::info!("Starting reelhouse on {address}");

    HttpServer::new(move || {
        let state = state.clone();
        let tokens = tokens.clone();

        App::new()
            .wrap(TracingLogger::default())
            .configure(move |sc| configure_endpoints(sc, state, tokens))
    })
    .bind(address)?
    .run()
    .await
}

impl ReelhouseConfiguration {
    /// Build the reelhouse configuration from commandline arguments
    pub fn build_default() -> color_eyre::Result<Self> {
        config::configure()
    }

    /// Install the default reelhouse tracer
    ///
    /// This is probably not useful for 3rd party applications that install their own tracing
    /// subscribers.
    pub fn install_tracing(self) -> color_eyre::Result<Self> {
        init_tracing(&self.config.tracing)?;
        Ok(self)
    }

    pub fn install_metrics(self) -> color_eyre::Result<Self> {
        if let Some(addr) = self.config.metrics.prometheus_address {
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()?;
        }

        Ok(self)
    }

    /// Run the selected operation
    pub async fn run(self) -> color_eyre::Result<()> {
        let ReelhouseConfiguration { config, operation } = self;

        let tokens = TokenAuthority::new(&config.auth.secret);

        match operation {
            Operation::Run => (),
            Operation::IssueToken { user_id, valid_for } => {
                let valid_for = time::Duration::hours(i64::try_from(valid_for)?);
                let token = tokens.issue(user_id, valid_for)?;

                println!("{token}");

                return Ok(());
            }
        }

        let tmp_dir = TmpDir::init(&config.server.temporary_directory).await?;
        let repo = repo::open(&config.repo)?;
        let store = Store::build(&config).await?;
        let tools: ArcMediaTools = Arc::new(Toolchain::from_config(&config.media));

        let state = State {
            config,
            tmp_dir: tmp_dir.clone(),
            repo,
            store,
            tools,
        };

        launch(state, tokens).await?;

        tmp_dir.cleanup().await?;

        Ok(())
    }
}
