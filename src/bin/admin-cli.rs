use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::{json, Value};

use customers_admin::config::schema::DatabaseConfig;
use customers_admin::db::Database;
use customers_admin::security::hash_password;

#[derive(Parser)]
#[command(name = "admin-cli")]
#[command(about = "Management CLI for the customers admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8788")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every customer, newest first
    List,
    /// Show one customer
    Get { id: String },
    /// Create a customer
    Create { nombre: String, email: String },
    /// Replace a customer's name and email
    Update {
        id: String,
        nombre: String,
        email: String,
    },
    /// Delete a customer
    Delete { id: String },
    /// Check a user's credentials against the login endpoint
    Login { email: String, password: String },
    /// Print the stored form of a password
    HashPassword { password: String },
    /// Insert a user directly into the database
    AddUser {
        email: String,
        password: String,
        #[arg(long, default_value = "sqlite://customers.db?mode=rwc")]
        database: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let customers = format!("{}/api/customers", cli.url);

    match cli.command {
        Commands::List => {
            let res = client.get(&customers).send().await?;
            print_response(res).await?;
        }
        Commands::Get { id } => {
            let res = client.get(format!("{}/{}", customers, id)).send().await?;
            print_response(res).await?;
        }
        Commands::Create { nombre, email } => {
            let res = client
                .post(&customers)
                .json(&json!({ "nombre": nombre, "email_contacto": email }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Update { id, nombre, email } => {
            let res = client
                .put(format!("{}/{}", customers, id))
                .json(&json!({ "nombre": nombre, "email_contacto": email }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Delete { id } => {
            let res = client.delete(format!("{}/{}", customers, id)).send().await?;
            print_response(res).await?;
        }
        Commands::Login { email, password } => {
            let res = client
                .post(format!("{}/api/auth/login", cli.url))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password));
        }
        Commands::AddUser {
            email,
            password,
            database,
        } => {
            let config = DatabaseConfig {
                url: database,
                ..DatabaseConfig::default()
            };
            let db = Database::connect(&config).await?;
            db.bootstrap().await?;
            let result = db
                .prepare("INSERT INTO Usuarios (email, password_hash) VALUES (?, ?)")
                .bind(email.as_str())
                .bind(hash_password(&password))
                .run()
                .await?;
            println!("Created user {} (id {})", email, result.meta.last_row_id);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status == StatusCode::NO_CONTENT {
        println!("Done ({})", status);
        return Ok(());
    }
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
