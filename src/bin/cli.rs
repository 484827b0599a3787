use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use prettytable::{Cell, Row, Table};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "foodgram")]
#[command(about = "A CLI tool for browsing recipes and downloading shopping lists", long_about = None)]
struct Cli {
    #[arg(long, default_value = "http://localhost:3000", help = "Base URL of the API")]
    api_url: String,

    #[arg(long, env = "FOODGRAM_TOKEN", help = "Auth token from /api/auth/token/login")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List recipes")]
    Recipes {
        #[arg(short, long, help = "Only recipes by this author id")]
        author: Option<String>,

        #[arg(short, long = "tag", help = "Tag slug; repeat to match any of several")]
        tags: Vec<String>,

        #[arg(long, help = "Only my favorites")]
        favorited: bool,

        #[arg(long, help = "Only recipes in my shopping cart")]
        in_cart: bool,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    #[command(about = "List tags")]
    Tags,

    #[command(about = "Search ingredients")]
    Ingredients {
        #[arg(short, long, help = "Part of the ingredient name")]
        name: Option<String>,
    },

    #[command(about = "Download the shopping list for my cart")]
    ShoppingList {
        #[arg(short, long, help = "Write to this file instead of stdout")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    color: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct Ingredient {
    name: String,
    measurement_unit: String,
}

#[derive(Debug, Deserialize)]
struct Author {
    username: String,
}

#[derive(Debug, Deserialize)]
struct Recipe {
    id: String,
    name: String,
    author: Author,
    tags: Vec<Tag>,
    cooking_time: u32,
    is_favorited: bool,
    is_in_shopping_cart: bool,
}

#[derive(Debug, Deserialize)]
struct RecipePage {
    count: usize,
    results: Vec<Recipe>,
}

struct Api {
    client: Client,
    base: String,
    token: Option<String>,
}

impl Api {
    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.client.get(format!("{}{path}", self.base));
        match &self.token {
            Some(token) => request.header("Authorization", format!("Token {token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.context("Request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("{status}: {error_text}");
        }
        Ok(response)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let api = Api {
        client: Client::new(),
        base: cli.api_url.trim_end_matches('/').to_string(),
        token: cli.token,
    };

    let result = match cli.command {
        Commands::Recipes {
            author,
            tags,
            favorited,
            in_cart,
            page,
        } => list_recipes(&api, author, tags, favorited, in_cart, page).await,
        Commands::Tags => list_tags(&api).await,
        Commands::Ingredients { name } => list_ingredients(&api, name).await,
        Commands::ShoppingList { output } => shopping_list(&api, output).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {e:#}");
        std::process::exit(1);
    }
}

async fn list_recipes(
    api: &Api,
    author: Option<String>,
    tags: Vec<String>,
    favorited: bool,
    in_cart: bool,
    page: usize,
) -> Result<()> {
    let mut query: Vec<(&str, String)> = vec![("page", page.to_string())];
    if let Some(author) = author {
        query.push(("author", author));
    }
    query.extend(tags.into_iter().map(|t| ("tags", t)));
    if favorited {
        query.push(("is_favorited", "1".to_string()));
    }
    if in_cart {
        query.push(("is_in_shopping_cart", "1".to_string()));
    }

    let page: RecipePage = api
        .send(api.get("/api/recipes").query(&query))
        .await?
        .json()
        .await?;

    if page.results.is_empty() {
        println!("📭 No recipes found.");
        return Ok(());
    }

    println!("\n📋 Recipes ({} total)\n", page.count);

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("ID"),
        Cell::new("Name"),
        Cell::new("Author"),
        Cell::new("Tags"),
        Cell::new("Minutes"),
        Cell::new("★"),
        Cell::new("🛒"),
    ]));

    for recipe in page.results {
        let tags: Vec<&str> = recipe.tags.iter().map(|t| t.slug.as_str()).collect();
        table.add_row(Row::new(vec![
            Cell::new(&recipe.id[..8]),
            Cell::new(&recipe.name),
            Cell::new(&recipe.author.username),
            Cell::new(&tags.join(", ")),
            Cell::new(&recipe.cooking_time.to_string()),
            Cell::new(if recipe.is_favorited { "yes" } else { "-" }),
            Cell::new(if recipe.is_in_shopping_cart { "yes" } else { "-" }),
        ]));
    }

    table.printstd();
    println!();
    Ok(())
}

async fn list_tags(api: &Api) -> Result<()> {
    let tags: Vec<Tag> = api.send(api.get("/api/tags")).await?.json().await?;

    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Name"),
        Cell::new("Color"),
        Cell::new("Slug"),
    ]));
    for tag in tags {
        table.add_row(Row::new(vec![
            Cell::new(&tag.name),
            Cell::new(&tag.color),
            Cell::new(&tag.slug),
        ]));
    }

    table.printstd();
    Ok(())
}

async fn list_ingredients(api: &Api, name: Option<String>) -> Result<()> {
    let mut request = api.get("/api/ingredients");
    if let Some(name) = name {
        request = request.query(&[("name", name)]);
    }
    let ingredients: Vec<Ingredient> = api.send(request).await?.json().await?;

    if ingredients.is_empty() {
        println!("📭 No ingredients found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Name"), Cell::new("Unit")]));
    for ingredient in ingredients {
        table.add_row(Row::new(vec![
            Cell::new(&ingredient.name),
            Cell::new(&ingredient.measurement_unit),
        ]));
    }

    table.printstd();
    Ok(())
}

async fn shopping_list(api: &Api, output: Option<PathBuf>) -> Result<()> {
    if api.token.is_none() {
        bail!("the shopping list needs --token");
    }

    let text = api
        .send(api.get("/api/recipes/download_shopping_cart"))
        .await?
        .text()
        .await?;

    match output {
        Some(path) => {
            fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Shopping list saved to {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
