//! Embedded chat page
//!
//! One input, one submit button, a response line and one table per city.
//! The serialized chat history lives in page state and is round-tripped
//! through every /api/chat call.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>City homicide statistics</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.1.3/dist/css/bootstrap.min.css">
</head>
<body>
  <div class="container mt-4">
    <h2 class="text-center mb-4" style="color:#2c3e50">
      Ask me anything. I'm your personal assistant that can search the web and extract data
    </h2>
    <input id="query-input" type="text" class="form-control mb-3"
           style="width:50%;height:40px;border-radius:10px"
           placeholder="look for {City} homicide data from {year} to {year} and extract in a table">
    <button id="submit-query" class="btn btn-primary mb-4"
            style="background-color:#2980b9;padding:10px 20px;border-radius:8px">Submit</button>
    <p id="response-space" class="text-muted" style="font-size:16px;white-space:pre-wrap"></p>
    <div id="table-container" class="mt-4"></div>
  </div>

  <script>
    // Client-held conversation state, round-tripped through the API.
    let history = "";

    const input = document.getElementById("query-input");
    const button = document.getElementById("submit-query");
    const responseSpace = document.getElementById("response-space");
    const tableContainer = document.getElementById("table-container");

    async function submitQuery() {
      const text = input.value.trim();
      if (!text) return;

      button.disabled = true;
      responseSpace.textContent = "Working...";

      try {
        const res = await fetch("/api/chat", {
          method: "POST",
          headers: { "Content-Type": "application/json" },
          body: JSON.stringify({ input: text, history: history }),
        });
        if (!res.ok) {
          responseSpace.textContent = "Error: " + await res.text();
          return;
        }
        const data = await res.json();
        history = data.history;
        responseSpace.textContent = data.reply;
        renderTables(data.tables);
      } catch (err) {
        responseSpace.textContent = "Error: " + err;
      } finally {
        button.disabled = false;
      }
    }

    function renderTables(tables) {
      tableContainer.innerHTML = "";
      for (const entry of tables) {
        const heading = document.createElement("h3");
        heading.className = "mt-4";
        heading.style.color = "#3498db";
        heading.textContent = entry.city;
        tableContainer.appendChild(heading);

        const table = document.createElement("table");
        table.className = "table table-bordered text-center";

        const thead = document.createElement("thead");
        const headRow = document.createElement("tr");
        for (const label of ["Year", "Murder Count"]) {
          const th = document.createElement("th");
          th.textContent = label;
          th.style.backgroundColor = "#2980b9";
          th.style.color = "white";
          headRow.appendChild(th);
        }
        thead.appendChild(headRow);
        table.appendChild(thead);

        const tbody = document.createElement("tbody");
        for (const row of entry.rows) {
          const tr = document.createElement("tr");
          for (const value of [row.year, row.count]) {
            const td = document.createElement("td");
            td.textContent = value;
            tr.appendChild(td);
          }
          tbody.appendChild(tr);
        }
        table.appendChild(tbody);
        tableContainer.appendChild(table);
      }
    }

    button.addEventListener("click", submitQuery);
    input.addEventListener("keydown", (e) => {
      if (e.key === "Enter") submitQuery();
    });
  </script>
</body>
</html>
"##;
