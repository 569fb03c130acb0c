use std::io;

use actix_files::Files;
use actix_identity::IdentityMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::{middleware, web, App, HttpServer};
use actix_web_flash_messages::storage::CookieMessageStore;
use actix_web_flash_messages::FlashMessagesFramework;
use tera::Tera;

use localserve::db::establish_connection_pool;
use localserve::media::MediaClient;
use localserve::models::config::ServerConfig;
use localserve::notify::{BookingNotifier, EmailNotifier, OwnerNotifier, SmsNotifier};
use localserve::repository::DieselRepository;
use localserve::routes;

#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("LOCALSERVE").separator("__"))
        .build()?;
    let server_config: ServerConfig = settings.try_deserialize()?;

    let pool = establish_connection_pool(&server_config.database_url)?;
    let repo = web::Data::new(DieselRepository::new(pool));

    let tera = web::Data::new(Tera::new("templates/**/*.html")?);

    let secret_key = Key::from(server_config.secret_key.as_bytes());
    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let flash_framework = FlashMessagesFramework::builder(message_store).build();

    let notifier = web::Data::new(
        BookingNotifier::new()
            .register(EmailNotifier::new(server_config.smtp.as_ref()))
            .register(SmsNotifier)
            .register(OwnerNotifier::new(server_config.smtp.as_ref())),
    );
    let media = web::Data::new(MediaClient::new(server_config.media.clone()));

    let address = format!("{}:{}", server_config.bind_address, server_config.port);
    log::info!("Starting Localserve on http://{address}");

    let config_data = web::Data::new(server_config);

    HttpServer::new(move || {
        App::new()
            .app_data(repo.clone())
            .app_data(tera.clone())
            .app_data(config_data.clone())
            .app_data(notifier.clone())
            .app_data(media.clone())
            .wrap(middleware::Logger::default())
            .wrap(flash_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                secret_key.clone(),
            ))
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .service(routes::main::index)
            .service(routes::main::services_list)
            .service(routes::main::category_root)
            .service(routes::main::category_list)
            .service(routes::main::business_detail)
            .service(routes::main::about)
            .service(routes::main::dashboard)
            .service(routes::auth::register_page)
            .service(routes::auth::register)
            .service(routes::auth::verify_page)
            .service(routes::auth::verify)
            .service(routes::auth::login_page)
            .service(routes::auth::login)
            .service(routes::auth::logout)
            .service(routes::auth::forgot_page)
            .service(routes::auth::forgot)
            .service(routes::auth::reset_page)
            .service(routes::auth::reset)
            .service(routes::auth::profile_page)
            .service(routes::auth::profile_update)
            .service(routes::bookings::create_booking)
            .service(routes::bookings::my_bookings)
            .service(routes::bookings::cancel_booking)
            .service(
                web::scope("/owner")
                    .service(routes::owner::dashboard)
                    .service(routes::owner::create_business_page)
                    .service(routes::owner::create_business)
                    .service(routes::owner::manage_business)
                    .service(routes::owner::update_business)
                    .service(routes::owner::deactivate_business_route)
                    .service(routes::owner::upload_business_photo)
                    .service(routes::owner::add_gallery)
                    .service(routes::owner::delete_gallery)
                    .service(routes::owner::create_service)
                    .service(routes::owner::update_service)
                    .service(routes::owner::deactivate_service_route)
                    .service(routes::owner::bookings)
                    .service(routes::owner::booking_detail)
                    .service(routes::owner::accept_booking)
                    .service(routes::owner::reject_booking)
                    .service(routes::owner::complete_booking)
                    .service(routes::owner::mark_payment),
            )
            .service(
                web::scope("/admin")
                    .service(routes::admin::dashboard)
                    .service(routes::admin::users)
                    .service(routes::admin::user_detail)
                    .service(routes::admin::toggle_user_status)
                    .service(routes::admin::businesses)
                    .service(routes::admin::business_detail)
                    .service(routes::admin::toggle_business_status)
                    .service(routes::admin::bookings)
                    .service(routes::admin::booking_detail)
                    .service(routes::admin::update_booking_status)
                    .service(routes::admin::categories)
                    .service(routes::admin::create_category)
                    .service(routes::admin::edit_category)
                    .service(routes::admin::delete_category)
                    .service(routes::admin::import_categories)
                    .service(routes::admin::export_bookings)
                    .service(routes::admin::audit),
            )
            .service(
                web::scope("/api")
                    .service(routes::api::api_v1_stats)
                    .service(routes::api::api_v1_slots)
                    .service(routes::api::api_v1_categories)
                    .service(routes::api::api_v1_businesses),
            )
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
